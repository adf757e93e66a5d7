//! 자격증명 저장소.
//!
//! "로그인 상태인가?"에 대한 단일 진실 공급원입니다. 모든 읽기/쓰기는
//! [`CredentialStore`]를 통해서만 이루어지며, 누구도 세션 파일을 직접 읽지 않습니다.
//!
//! 저장 매체를 사용할 수 없는 경우(읽기 실패, 손상된 파일, 쓰기 권한 없음)
//! 에러를 반환하지 않고 경고 로그만 남긴 뒤 "토큰 없음"으로 취급합니다.

use crate::domain::{Credential, Identity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use fs4::fs_std::FileExt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, warn};

/// 자격증명 저장소 인터페이스.
///
/// 토큰이 없으면 캐시된 신원도 없는 것으로 취급해야 합니다.
pub trait CredentialStore: Send + Sync {
    /// 토큰 저장. 기존 토큰과 캐시된 신원을 덮어씁니다.
    fn set(&self, token: Credential);

    /// 현재 토큰 반환.
    fn get(&self) -> Option<Credential>;

    /// 토큰과 캐시된 신원 삭제. 멱등입니다.
    fn clear(&self);

    /// 현재 토큰에 대한 신원 스냅샷 캐시. 토큰이 없으면 무시됩니다.
    fn cache_identity(&self, identity: Identity);

    /// `token`이 여전히 현재 토큰일 때만 삭제. 비교와 삭제는 한 번의 잠금 안에서 수행됩니다.
    ///
    /// 삭제했으면 `true`.
    fn clear_if(&self, token: &Credential) -> bool;

    /// `token`이 여전히 현재 토큰일 때만 신원 캐시.
    fn cache_identity_for(&self, token: &Credential, identity: Identity) -> bool;

    /// 캐시된 신원 반환 (표시용, 권한 판단에 사용 금지).
    fn cached_identity(&self) -> Option<Identity>;

    /// 토큰 저장 시각.
    fn saved_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// 토큰 보유 여부.
    fn is_logged_in(&self) -> bool {
        self.get().is_some()
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn set(&self, token: Credential) {
        (**self).set(token)
    }

    fn get(&self) -> Option<Credential> {
        (**self).get()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn cache_identity(&self, identity: Identity) {
        (**self).cache_identity(identity)
    }

    fn clear_if(&self, token: &Credential) -> bool {
        (**self).clear_if(token)
    }

    fn cache_identity_for(&self, token: &Credential, identity: Identity) -> bool {
        (**self).cache_identity_for(token, identity)
    }

    fn cached_identity(&self) -> Option<Identity> {
        (**self).cached_identity()
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        (**self).saved_at()
    }
}

/// 저장되는 세션 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<Identity>,
    saved_at: DateTime<Utc>,
}

impl SessionRecord {
    fn new(token: Credential) -> Self {
        Self {
            token: token.expose().to_owned(),
            identity: None,
            saved_at: Utc::now(),
        }
    }

    fn holds(&self, token: &Credential) -> bool {
        self.token == token.expose()
    }

    /// 빈 토큰 레코드는 없는 것으로 취급.
    fn into_valid(self) -> Option<Self> {
        if self.token.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// 메모리 내 자격증명 저장소.
///
/// 프로세스 종료 시 사라집니다. 테스트와 일회성 세션용.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    record: RwLock<Option<SessionRecord>>,
}

impl MemoryCredentialStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 토큰이 들어 있는 저장소 생성.
    pub fn with_token(token: impl Into<Credential>) -> Self {
        let store = Self::new();
        store.set(token.into());
        store
    }

    fn read(&self) -> Option<SessionRecord> {
        let guard = self.record.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    fn write(&self, value: Option<SessionRecord>) {
        let mut guard = self.record.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = value;
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set(&self, token: Credential) {
        self.write(SessionRecord::new(token).into_valid());
    }

    fn get(&self) -> Option<Credential> {
        self.read().map(|r| Credential::new(r.token))
    }

    fn clear(&self) {
        self.write(None);
    }

    fn cache_identity(&self, identity: Identity) {
        let mut guard = self.record.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(record) = guard.as_mut() {
            record.identity = Some(identity);
        }
    }

    fn clear_if(&self, token: &Credential) -> bool {
        let mut guard = self.record.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.as_ref().is_some_and(|record| record.holds(token)) {
            *guard = None;
            true
        } else {
            false
        }
    }

    fn cache_identity_for(&self, token: &Credential, identity: Identity) -> bool {
        let mut guard = self.record.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_mut() {
            Some(record) if record.holds(token) => {
                record.identity = Some(identity);
                true
            }
            _ => false,
        }
    }

    fn cached_identity(&self) -> Option<Identity> {
        self.read().and_then(|r| r.identity)
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.read().map(|r| r.saved_at)
    }
}

/// JSON 세션 파일 기반 자격증명 저장소.
///
/// 쓰기는 같은 디렉터리의 고유한 임시 파일 작성 후 rename으로 원자적으로 수행되며,
/// Unix에서는 파일 권한이 0600입니다.
///
/// 모든 변경은 프로세스 내 잠금과 `<세션 파일>.lock`의 OS 배타 잠금을 함께 잡은 상태에서
/// 수행되므로, 여러 `signdesk` 프로세스가 같은 세션 파일을 써도 읽기-비교-쓰기가 섞이지 않습니다.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// 세션 파일 경로로 저장소 생성. 파일은 첫 `set`에서 만들어집니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// 세션 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Option<SessionRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Session file unreadable, treating as logged out");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&contents) {
            Ok(record) => record.into_valid(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Session file corrupt, treating as logged out");
                None
            }
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// 프로세스 내 잠금과 프로세스 간 파일 잠금 획득.
    ///
    /// 잠금 파일을 열 수 없으면 경고만 남기고 프로세스 내 잠금으로 진행합니다.
    fn lock(&self) -> WriteGuard<'_> {
        let local = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let lock_path = self.lock_path();
        let file = fs::create_dir_all(self.parent_dir())
            .and_then(|()| {
                fs::OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .read(true)
                    .write(true)
                    .open(&lock_path)
            })
            .and_then(|file| FileExt::lock_exclusive(&file).map(|()| file));

        let file = match file {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %lock_path.display(), error = %e, "Session lock unavailable");
                None
            }
        };

        WriteGuard {
            _local: local,
            _file: file,
        }
    }

    fn persist(&self, record: &SessionRecord) -> std::io::Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(record)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".session-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn store(&self, record: &SessionRecord) -> bool {
        match self.persist(record) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session file written");
                true
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to write session file");
                false
            }
        }
    }
}

/// 세션 파일 변경 잠금. drop 시 파일 잠금도 풀립니다.
struct WriteGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _file: Option<fs::File>,
}

impl CredentialStore for FileCredentialStore {
    fn set(&self, token: Credential) {
        let _guard = self.lock();
        match SessionRecord::new(token).into_valid() {
            Some(record) => {
                // 이전 사용자의 토큰이 남아 있으면 안 됨
                if !self.store(&record) {
                    remove_quietly(&self.path);
                }
            }
            None => {
                warn!("Refusing to persist blank token, clearing session instead");
                remove_quietly(&self.path);
            }
        }
    }

    fn get(&self) -> Option<Credential> {
        self.load().map(|r| Credential::new(r.token))
    }

    fn clear(&self) {
        let _guard = self.lock();
        remove_quietly(&self.path);
    }

    fn cache_identity(&self, identity: Identity) {
        let _guard = self.lock();
        if let Some(mut record) = self.load() {
            record.identity = Some(identity);
            self.store(&record);
        }
    }

    fn clear_if(&self, token: &Credential) -> bool {
        let _guard = self.lock();
        match self.load() {
            Some(record) if record.holds(token) => {
                remove_quietly(&self.path);
                true
            }
            _ => false,
        }
    }

    fn cache_identity_for(&self, token: &Credential, identity: Identity) -> bool {
        let _guard = self.lock();
        match self.load() {
            Some(mut record) if record.holds(token) => {
                record.identity = Some(identity);
                self.store(&record)
            }
            _ => false,
        }
    }

    fn cached_identity(&self) -> Option<Identity> {
        self.load().and_then(|r| r.identity)
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.load().map(|r| r.saved_at)
    }
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Session file removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove session file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use proptest::prelude::*;

    fn identity() -> Identity {
        Identity::new(1, "a@x.com", Role::Uploader)
    }

    fn exercise_store(store: &dyn CredentialStore) {
        assert!(store.get().is_none());
        assert!(!store.is_logged_in());

        store.set(Credential::new("token-1"));
        assert_eq!(store.get(), Some(Credential::new("token-1")));
        assert!(store.saved_at().is_some());

        store.cache_identity(identity());
        assert_eq!(store.cached_identity(), Some(identity()));

        // 새 토큰은 이전 신원 캐시를 버림
        store.set(Credential::new("token-2"));
        assert_eq!(store.get(), Some(Credential::new("token-2")));
        assert!(store.cached_identity().is_none());

        store.cache_identity(identity());
        store.clear();
        assert!(store.get().is_none());
        assert!(store.cached_identity().is_none());

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_memory_store_lifecycle() {
        exercise_store(&MemoryCredentialStore::new());
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        exercise_store(&FileCredentialStore::new(dir.path().join("session.json")));
    }

    #[test]
    fn test_identity_not_cached_without_token() {
        let store = MemoryCredentialStore::new();
        store.cache_identity(identity());
        assert!(store.cached_identity().is_none());

        let dir = tempfile::tempdir().unwrap();
        let file_store = FileCredentialStore::new(dir.path().join("session.json"));
        file_store.cache_identity(identity());
        assert!(file_store.cached_identity().is_none());
        assert!(!file_store.path().exists());
    }

    #[test]
    fn test_file_store_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileCredentialStore::new(&path).set(Credential::new("persisted"));
        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get(), Some(Credential::new("persisted")));
    }

    #[test]
    fn test_file_store_corrupt_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.get().is_none());
        assert!(store.cached_identity().is_none());
    }

    #[test]
    fn test_file_store_unusable_medium_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "plain file").unwrap();

        // 상위 경로가 일반 파일이면 읽기/쓰기 모두 실패
        let store = FileCredentialStore::new(blocker.join("session.json"));
        store.set(Credential::new("token"));
        assert!(store.get().is_none());
        store.clear();
    }

    fn exercise_conditional_updates(store: &dyn CredentialStore) {
        let old = Credential::new("old-token");
        let new = Credential::new("new-token");

        store.set(new.clone());
        assert!(!store.cache_identity_for(&old, identity()));
        assert!(store.cached_identity().is_none());
        assert!(!store.clear_if(&old));
        assert_eq!(store.get(), Some(new.clone()));

        assert!(store.cache_identity_for(&new, identity()));
        assert_eq!(store.cached_identity(), Some(identity()));
        assert!(store.clear_if(&new));
        assert!(store.get().is_none());
        assert!(!store.clear_if(&new));
    }

    #[test]
    fn test_memory_store_conditional_updates() {
        exercise_conditional_updates(&MemoryCredentialStore::new());
    }

    #[test]
    fn test_file_store_conditional_updates() {
        let dir = tempfile::tempdir().unwrap();
        exercise_conditional_updates(&FileCredentialStore::new(dir.path().join("session.json")));
    }

    #[test]
    fn test_file_store_concurrent_writers_leave_valid_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        // 인스턴스마다 별도 잠금을 가지므로 프로세스 간 경합과 같은 상황
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = FileCredentialStore::new(path);
                    for round in 0..20 {
                        store.set(Credential::new(format!("token-{}-{}", worker, round)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let token = FileCredentialStore::new(&path).get().unwrap();
        assert!(token.expose().starts_with("token-"));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }

    #[test]
    fn test_blank_token_is_not_stored() {
        let store = MemoryCredentialStore::with_token("  ");
        assert!(store.get().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileCredentialStore::new(&path).set(Credential::new("token"));

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    proptest! {
        #[test]
        fn prop_clear_always_yields_absent(token in "[A-Za-z0-9._-]{0,64}", twice in any::<bool>()) {
            let store = MemoryCredentialStore::new();
            store.set(Credential::new(token));
            store.clear();
            if twice {
                store.clear();
            }
            prop_assert!(store.get().is_none());
            prop_assert!(store.cached_identity().is_none());
        }
    }
}
