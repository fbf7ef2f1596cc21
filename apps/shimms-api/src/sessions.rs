//! 进程内会话表：每个身份最多一个活动会话。

use domain::{Event, EventKind};
use shimms_auth::Session;
use shimms_events::{EventHandler, Subscription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

struct SessionEntry {
    session: Arc<Session>,
    // 会话期间的数据变更日志订阅，随条目一起释放。
    _audit: Subscription,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 登记新会话；同一身份的旧会话先被结束。
    pub async fn insert(&self, session: Session) -> Arc<Session> {
        let identity_id = session.context().identity.id;
        let session = Arc::new(session);
        let audit = subscribe_audit(&session, identity_id.clone());
        let previous = self.sessions.write().await.insert(
            identity_id,
            SessionEntry {
                session: session.clone(),
                _audit: audit,
            },
        );
        if let Some(previous) = previous {
            previous.session.end().await;
        }
        session
    }

    pub async fn get(&self, identity_id: &str) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .await
            .get(identity_id)
            .map(|entry| entry.session.clone())
    }

    /// 移除并结束会话；不存在时返回 false。
    pub async fn remove(&self, identity_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(identity_id);
        match removed {
            Some(entry) => {
                entry.session.end().await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn subscribe_audit(session: &Session, identity_id: String) -> Subscription {
    let handler: EventHandler = Arc::new(move |event: &Event| {
        info!(
            target: "shimms.session",
            identity_id = %identity_id,
            origin = event.origin.map(|origin| origin.as_str()),
            "session_data_changed"
        );
    });
    session.bus().subscribe(&[EventKind::UserDataChanged], &handler)
}
