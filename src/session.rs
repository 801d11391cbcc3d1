//! Feed Session
//!
//! One mount-to-unmount lifetime of the post wall. A single task owns the
//! post list and is its only mutator: it commits the initial load, reduces
//! push events one at a time, and applies local toggles. Every new list is
//! published on a watch channel for renderers.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::PostSource;
use crate::feed::{self, PostList};
use crate::live::EventChannel;

/// User-interaction triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleAiReply(String),
}

/// A mounted feed
pub struct FeedSession {
    posts: watch::Receiver<PostList>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedSession {
    /// Mount: start the initial load and begin consuming `channel`
    pub fn mount<C>(source: Arc<dyn PostSource>, channel: C) -> Self
    where
        C: EventChannel + 'static,
    {
        let (posts_tx, posts_rx) = watch::channel(PostList::new());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(source, channel, posts_tx, commands_rx, cancel.clone()));

        tracing::info!("Feed session mounted");
        Self {
            posts: posts_rx,
            commands: commands_tx,
            cancel,
            task: Some(task),
        }
    }

    /// Current post list
    pub fn posts(&self) -> PostList {
        self.posts.borrow().clone()
    }

    /// A receiver that is notified on every committed change
    pub fn watch(&self) -> watch::Receiver<PostList> {
        self.posts.clone()
    }

    /// Flip a post's local AI-reply flag
    pub fn toggle_ai_reply(&self, post_id: impl Into<String>) {
        let _ = self.commands.send(Command::ToggleAiReply(post_id.into()));
    }

    /// Tear down: discard any pending load, close the channel, and wait for
    /// the session task to finish
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Feed session task failed");
            }
        }
        tracing::info!("Feed session unmounted");
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Run the initial load, committing nothing if `token` is cancelled first.
///
/// Returns `None` on cancellation or failure; failures are logged.
pub async fn load_initial(source: &dyn PostSource, token: &CancellationToken) -> Option<PostList> {
    let result = tokio::select! {
        _ = token.cancelled() => {
            tracing::debug!("Initial load cancelled");
            return None;
        }
        result = source.fetch_posts() => result,
    };

    if token.is_cancelled() {
        tracing::debug!("Discarding initial load after teardown");
        return None;
    }

    match result {
        Ok(posts) => {
            tracing::info!(count = posts.len(), "Initial load complete");
            Some(feed::from_initial(posts))
        }
        Err(e) => {
            tracing::error!(error = %e, "Initial load failed");
            None
        }
    }
}

async fn run<C>(
    source: Arc<dyn PostSource>,
    mut channel: C,
    posts: watch::Sender<PostList>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) where
    C: EventChannel,
{
    let load = load_initial(source.as_ref(), &cancel);
    tokio::pin!(load);
    let mut loading = true;
    let mut live = true;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            loaded = &mut load, if loading => {
                loading = false;
                if let Some(list) = loaded {
                    posts.send_replace(list);
                }
            }

            command = commands.recv() => match command {
                Some(Command::ToggleAiReply(post_id)) => {
                    let next = feed::toggle_ai_reply(&posts.borrow(), &post_id);
                    posts.send_replace(next);
                }
                None => break,
            },

            event = channel.recv(), if live => match event {
                Some(event) => {
                    tracing::debug!(kind = %event.kind(), post_id = %event.post_id(), "Applying event");
                    let next = feed::apply(&posts.borrow(), &event);
                    posts.send_replace(next);
                }
                None => {
                    tracing::warn!("Push channel ended; feed will no longer update");
                    live = false;
                }
            },
        }
    }

    channel.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::feed::{Comment, CommentVerb, FeedEvent, Post};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticSource {
        posts: Vec<Post>,
        delay: Duration,
    }

    #[async_trait]
    impl PostSource for StaticSource {
        async fn fetch_posts(&self) -> Result<Vec<Post>, ClientError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.posts.clone())
        }
    }

    #[derive(Default)]
    struct FailingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PostSource for FailingSource {
        async fn fetch_posts(&self) -> Result<Vec<Post>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Unavailable)
        }
    }

    struct QueueChannel {
        events: mpsc::UnboundedReceiver<FeedEvent>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventChannel for QueueChannel {
        async fn recv(&mut self) -> Option<FeedEvent> {
            self.events.recv().await
        }

        async fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn queue() -> (mpsc::UnboundedSender<FeedEvent>, QueueChannel, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));
        let channel = QueueChannel {
            events: rx,
            closes: Arc::clone(&closes),
        };
        (tx, channel, closes)
    }

    fn two_posts(delay: Duration) -> Arc<dyn PostSource> {
        Arc::new(StaticSource {
            posts: vec![Post::new("p1").counts(2, 0), Post::new("p2")],
            delay,
        })
    }

    async fn wait_for<F>(rx: &mut watch::Receiver<PostList>, pred: F) -> PostList
    where
        F: Fn(&PostList) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let current = rx.borrow_and_update();
                    if pred(&current) {
                        return current.clone();
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_then_reconcile() {
        let (events, channel, closes) = queue();
        let session = FeedSession::mount(two_posts(Duration::ZERO), channel);
        let mut rx = session.watch();

        wait_for(&mut rx, |p| p.len() == 2).await;

        events
            .send(FeedEvent::Comment {
                post_id: "p1".to_string(),
                verb: CommentVerb::Upsert("add".to_string()),
                comment: Comment::new("c1", "hi", "u"),
            })
            .unwrap();
        let list = wait_for(&mut rx, |p| p[0].comments_count == 1).await;
        assert_eq!(list[0].comments[0].id, "c1");

        events
            .send(FeedEvent::PostRemoved {
                post_id: "p2".to_string(),
            })
            .unwrap();
        let list = wait_for(&mut rx, |p| p.len() == 1).await;
        assert_eq!(list[0].id, "p1");

        session.unmount().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_toggle_through_session() {
        let (_events, channel, _closes) = queue();
        let session = FeedSession::mount(two_posts(Duration::ZERO), channel);
        let mut rx = session.watch();
        wait_for(&mut rx, |p| p.len() == 2).await;

        session.toggle_ai_reply("p2");
        let list = wait_for(&mut rx, |p| p[1].ai_reply).await;
        assert!(!list[0].ai_reply);

        session.toggle_ai_reply("p2");
        wait_for(&mut rx, |p| !p[1].ai_reply).await;
        session.unmount().await;
    }

    #[tokio::test]
    async fn test_unmount_before_load_discards_result() {
        let (_events, channel, closes) = queue();
        let session = FeedSession::mount(two_posts(Duration::from_millis(200)), channel);
        let rx = session.watch();

        session.unmount().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(rx.borrow().is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_failure_leaves_list_empty() {
        let (events, channel, _closes) = queue();
        let source = Arc::new(FailingSource::default());
        let session = FeedSession::mount(Arc::clone(&source) as Arc<dyn PostSource>, channel);
        let mut rx = session.watch();

        tokio::time::timeout(Duration::from_secs(5), async {
            while source.calls.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.borrow().is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        // Events still flow after a failed load
        events
            .send(FeedEvent::PostCreated {
                post: Post::new("p7"),
            })
            .unwrap();
        let list = wait_for(&mut rx, |p| p.len() == 1).await;
        assert_eq!(list[0].id, "p7");
        session.unmount().await;
    }

    #[tokio::test]
    async fn test_load_replaces_events_applied_before_it() {
        let (events, channel, _closes) = queue();
        let session = FeedSession::mount(two_posts(Duration::from_millis(200)), channel);
        let mut rx = session.watch();

        events
            .send(FeedEvent::PostCreated {
                post: Post::new("p7"),
            })
            .unwrap();
        let early = wait_for(&mut rx, |p| p.len() == 1).await;
        assert_eq!(early[0].id, "p7");

        let loaded = wait_for(&mut rx, |p| p.len() == 2).await;
        assert_eq!(loaded[0].id, "p1");
        assert_eq!(loaded[1].id, "p2");
        assert!(loaded.iter().all(|p| p.id != "p7"));
        session.unmount().await;
    }

    #[tokio::test]
    async fn test_load_commits_without_push_channel() {
        let session = FeedSession::mount(two_posts(Duration::ZERO), None::<QueueChannel>);
        let mut rx = session.watch();

        let list = wait_for(&mut rx, |p| p.len() == 2).await;
        assert_eq!(list[0].likes, 2);

        // Local toggles keep working with no channel
        session.toggle_ai_reply("p1");
        wait_for(&mut rx, |p| p[0].ai_reply).await;
        session.unmount().await;
    }

    #[tokio::test]
    async fn test_load_initial_honours_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let source = StaticSource {
            posts: vec![Post::new("p1")],
            delay: Duration::ZERO,
        };
        assert!(load_initial(&source, &token).await.is_none());

        let live = CancellationToken::new();
        let list = load_initial(&source, &live).await.unwrap();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_closes_channel_once() {
        let (_events, channel, closes) = queue();
        let session = FeedSession::mount(two_posts(Duration::ZERO), channel);
        drop(session);

        tokio::time::timeout(Duration::from_secs(5), async {
            while closes.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
