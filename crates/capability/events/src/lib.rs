//! 全局事件总线：数据变更的进程内发布/订阅。
//!
//! - 按事件类型（封闭枚举）路由，同步投递，单次发布内按注册顺序
//! - 具体事件投递完后再以 `userDataChanged` 广播一次
//! - 同一 handler 对同一类型重复订阅不会重复投递；条目按句柄计数，最后一个句柄释放时才退订
//! - 订阅者 panic 被隔离，不影响后续订阅者
//! - 无持久化、无回放：晚订阅者看不到历史事件

use domain::{Event, EventKind};
use serde_json::Value;
use shimms_telemetry::{record_event_published, record_listener_failure};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, warn};

/// 订阅回调。
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Clone)]
struct ListenerEntry {
    id: u64,
    kind: EventKind,
    handler: EventHandler,
    // 持有该条目的 Subscription 数。
    refs: usize,
}

struct BusInner {
    listeners: RwLock<Vec<ListenerEntry>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn read(&self) -> RwLockReadGuard<'_, Vec<ListenerEntry>> {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ListenerEntry>> {
        self.listeners.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, ids: &[u64]) {
        if ids.is_empty() {
            return;
        }
        let mut listeners = self.write();
        for id in ids {
            if let Some(entry) = listeners.iter_mut().find(|entry| entry.id == *id) {
                entry.refs = entry.refs.saturating_sub(1);
            }
        }
        listeners.retain(|entry| entry.refs > 0);
    }
}

/// 会话级事件总线（克隆共享同一订阅表）。
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

fn same_handler(a: &EventHandler, b: &EventHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// 为 handler 订阅一组事件类型。
    ///
    /// 已对某类型订阅过的同一 handler（按 `Arc` 身份判断）不会再次登记，
    /// 而是共享已有条目：每个返回的 `Subscription` 各持一份引用，
    /// 全部句柄释放后条目才移除。
    pub fn subscribe(&self, kinds: &[EventKind], handler: &EventHandler) -> Subscription {
        let mut held = Vec::with_capacity(kinds.len());
        let mut added = 0;
        {
            let mut listeners = self.inner.write();
            for &kind in kinds {
                let existing = listeners
                    .iter_mut()
                    .find(|entry| entry.kind == kind && same_handler(&entry.handler, handler));
                if let Some(entry) = existing {
                    entry.refs += 1;
                    held.push(entry.id);
                    continue;
                }
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                listeners.push(ListenerEntry {
                    id,
                    kind,
                    handler: handler.clone(),
                    refs: 1,
                });
                held.push(id);
                added += 1;
            }
        }
        debug!(
            target: "shimms.events",
            kinds = kinds.len(),
            added,
            shared = held.len() - added,
            "listener_subscribed"
        );
        Subscription {
            bus: Arc::downgrade(&self.inner),
            ids: held,
        }
    }

    /// 发布事件，返回成功投递的次数（含通用事件的二次广播）。
    pub fn publish(&self, kind: EventKind, detail: Option<Value>) -> usize {
        let event = Event::new(kind, detail);
        let mut delivered = self.dispatch(&event);
        if !kind.is_generic() {
            delivered += self.dispatch(&Event::generic_from(&event));
        }
        delivered
    }

    /// 当前订阅某类型的条目数。
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .read()
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    /// 清空全部订阅（会话结束）。
    pub fn clear(&self) {
        let removed = {
            let mut listeners = self.inner.write();
            let count = listeners.len();
            listeners.clear();
            count
        };
        debug!(target: "shimms.events", removed, "listeners_cleared");
    }

    fn dispatch(&self, event: &Event) -> usize {
        // 先取快照再回调，回调中可重入订阅/退订/发布。
        let handlers: Vec<EventHandler> = self
            .inner
            .read()
            .iter()
            .filter(|entry| entry.kind == event.kind)
            .map(|entry| entry.handler.clone())
            .collect();
        record_event_published();

        let mut delivered = 0;
        for (index, handler) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    record_listener_failure();
                    warn!(
                        target: "shimms.events",
                        kind = event.kind.as_str(),
                        listener_index = index,
                        error = panic_message(payload.as_ref()),
                        "listener_failed"
                    );
                }
            }
        }
        debug!(
            target: "shimms.events",
            kind = event.kind.as_str(),
            origin = event.origin.map(|origin| origin.as_str()),
            listeners = handlers.len(),
            delivered,
            "event_published"
        );
        delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "listener panicked"
    }
}

/// 订阅句柄；`unsubscribe()` 或 drop 时退订。
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<BusInner>,
    ids: Vec<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// 本句柄持有的条目数（含与其他句柄共享的条目）。
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn release(&mut self) {
        let ids = std::mem::take(&mut self.ids);
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(&ids);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
