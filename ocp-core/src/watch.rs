use std::fmt;
use std::time::Duration;

use futures::stream::{
    self,
    BoxStream,
    StreamExt,
};
use kube::api::{
    DynamicObject,
    WatchEvent,
};
use tokio::time::Instant;
use tracing::*;

use crate::errors::*;
use crate::k8s::{
    ClusterError,
    ResourceClient,
    ResourceKind,
    ResourceSnapshot,
    Selector,
};
use crate::prelude::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            EventType::Added => "ADDED",
            EventType::Modified => "MODIFIED",
            EventType::Deleted => "DELETED",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub type_: EventType,
    pub object: ResourceSnapshot,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WatchTarget {
    Name(String),
    Selector(Selector),
}

impl WatchTarget {
    fn selector(&self) -> Selector {
        match self {
            WatchTarget::Name(name) => Selector::name(name),
            WatchTarget::Selector(sel) => sel.clone(),
        }
    }
}

// An EventWatcher produces a finite stream of change events for one object (or a label/field
// selected set of objects).  The timeout is handed to the apiserver, which closes the stream when
// it runs out; we never try to reopen a stream the server closed early.  The apiserver won't
// accept a single watch longer than MAX_WATCH_WINDOW_SECONDS, so longer budgets are split into
// back-to-back windows, each one picking up from the last resourceVersion we saw.  A window only
// counts as "run out" if it stayed open for (about) as long as we asked for; anything shorter is
// the server ending the watch, and that ends the stream.
pub struct EventWatcher {
    api: kube::Api<DynamicObject>,
    description: String,
    selector: Selector,
    budget_seconds: u64,
    max_window_seconds: u64,
    resource_version: String,
}

struct Cursor {
    watcher: EventWatcher,
    remaining_seconds: u64,
    resource_version: String,
    window: Option<Window>,
}

struct Window {
    events: BoxStream<'static, kube::Result<WatchEvent<DynamicObject>>>,
    opened_at: Instant,
    seconds: u64,
}

impl Window {
    // The apiserver's own timer and ours don't start at exactly the same moment
    fn ran_full_length(&self) -> bool {
        self.opened_at.elapsed() + Duration::from_secs(WATCH_WINDOW_SLACK_SECONDS) >= Duration::from_secs(self.seconds)
    }
}

impl EventWatcher {
    pub fn new(
        client: &ResourceClient,
        kind: &ResourceKind,
        ns: Option<&str>,
        target: WatchTarget,
        timeout: Duration,
    ) -> EventWatcher {
        let description = match (&target, ns) {
            (WatchTarget::Name(name), Some(ns)) if kind.is_namespaced() => format!("{} {ns}/{name}", kind.kind),
            (WatchTarget::Name(name), _) => format!("{} {name}", kind.kind),
            (WatchTarget::Selector(sel), _) => {
                let scope = ns.filter(|_| kind.is_namespaced()).unwrap_or("<all namespaces>");
                format!("{} in {scope} ({})", kind.kind, describe_selector(sel))
            },
        };

        EventWatcher {
            api: client.api(kind, ns),
            description,
            selector: target.selector(),
            budget_seconds: timeout.as_secs().max(1),
            max_window_seconds: MAX_WATCH_WINDOW_SECONDS,
            resource_version: "0".into(),
        }
    }

    // Only events newer than this resourceVersion are delivered
    pub fn starting_at(mut self, resource_version: &str) -> EventWatcher {
        self.resource_version = resource_version.into();
        self
    }

    pub fn with_max_window(mut self, seconds: u64) -> EventWatcher {
        self.max_window_seconds = seconds.max(1);
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_seconds)
    }

    pub fn events(self) -> BoxStream<'static, anyhow::Result<Event>> {
        debug!("watching {} for up to {}s", self.description, self.budget_seconds);
        let cursor = Cursor {
            remaining_seconds: self.budget_seconds,
            resource_version: self.resource_version.clone(),
            watcher: self,
            window: None,
        };
        stream::unfold(Some(cursor), |state| async move { next_event(state?).await }).boxed()
    }
}

// Returning None for the state after an error guarantees the stream ends right after the error
async fn next_event(mut cur: Cursor) -> Option<(anyhow::Result<Event>, Option<Cursor>)> {
    loop {
        let Some(window) = cur.window.as_mut() else {
            if cur.remaining_seconds == 0 {
                debug!("watch budget for {} is spent", cur.watcher.description);
                return None;
            }

            let seconds = cur.remaining_seconds.min(cur.watcher.max_window_seconds);
            cur.remaining_seconds -= seconds;
            let wp = cur.watcher.selector.watch_params().timeout(seconds as u32);
            let opened_at = Instant::now();
            match cur.watcher.api.watch(&wp, &cur.resource_version).await {
                Ok(events) => cur.window = Some(Window { events: events.boxed(), opened_at, seconds }),
                Err(err) => {
                    let class = ClusterError::Transport(format!("could not watch {}", cur.watcher.description));
                    return Some((Err(anyhow::Error::from(err).context(class)), None));
                },
            }
            continue;
        };

        let (type_, obj) = match window.events.next().await {
            Some(Ok(WatchEvent::Added(obj))) => (EventType::Added, obj),
            Some(Ok(WatchEvent::Modified(obj))) => (EventType::Modified, obj),
            Some(Ok(WatchEvent::Deleted(obj))) => (EventType::Deleted, obj),
            Some(Ok(WatchEvent::Bookmark(bm))) => {
                cur.resource_version = bm.metadata.resource_version;
                continue;
            },
            Some(Ok(WatchEvent::Error(resp))) => {
                let err = ClusterError::transport(&format!(
                    "watch on {} failed ({}): {}",
                    cur.watcher.description, resp.code, resp.message
                ));
                return Some((Err(err), None));
            },
            Some(Err(err)) => {
                let class = ClusterError::Transport(format!("watch on {} failed", cur.watcher.description));
                return Some((Err(anyhow::Error::from(err).context(class)), None));
            },
            None if window.ran_full_length() => {
                cur.window = None;
                continue;
            },
            None => {
                debug!("watch on {} was closed by the server", cur.watcher.description);
                return None;
            },
        };

        if let Some(rv) = obj.metadata.resource_version.as_ref() {
            cur.resource_version.clone_from(rv);
        }
        trace!("{type_} event for {} on {}", obj.name_any(), cur.watcher.description);
        let event = Event { type_, object: obj.into() };
        return Some((Ok(event), Some(cur)));
    }
}

fn describe_selector(sel: &Selector) -> String {
    match (&sel.labels, &sel.fields) {
        (Some(labels), Some(fields)) => format!("labels={labels}, fields={fields}"),
        (Some(labels), None) => format!("labels={labels}"),
        (None, Some(fields)) => format!("fields={fields}"),
        (None, None) => "everything".into(),
    }
}
