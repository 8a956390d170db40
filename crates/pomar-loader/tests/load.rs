use pomar_core::RetryPolicy;
use pomar_loader::{
    ContentLoader, Document, ERROR_PANEL, FRAGMENT_DELAY, FetchError, FragmentSource, HeadNode,
    LoaderConfig, LoaderError, RETRY_DELAY,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Status(u16),
    /// Answer only after the delay.
    Slow(Duration, String),
}

/// Serves scripted replies per path; the last reply for a path repeats.
#[derive(Default)]
struct ScriptedSource {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    log: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedSource {
    fn with(mut self, path: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies
            .get_mut()
            .unwrap()
            .insert(path.to_string(), replies.into_iter().collect());
        self
    }

    fn requests(&self) -> Vec<(String, Instant)> {
        self.log.lock().unwrap().clone()
    }

    fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|(p, _)| p).collect()
    }
}

impl FragmentSource for ScriptedSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.log
            .lock()
            .unwrap()
            .push((path.to_string(), Instant::now()));
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(path) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Slow(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Some(Reply::Status(status)) => Err(FetchError::Status {
                path: path.to_string(),
                status,
            }),
            None => Err(FetchError::Status {
                path: path.to_string(),
                status: 404,
            }),
        }
    }
}

fn body(text: &str) -> Reply {
    Reply::Body(text.to_string())
}

fn three_fragment_page() -> ScriptedSource {
    ScriptedSource::default()
        .with("fragments/index.txt", [body("fragments: 3\nfilesize: 900")])
        .with(
            "/fragments/fragment_0",
            [body("<html><head><style>.a{color:red}</style></head><bo")],
        )
        .with("/fragments/fragment_1", [body("dy><div id=\"chat\">")])
        .with(
            "/fragments/fragment_2",
            [body("</div><script>start()</script></body></html>")],
        )
}

#[tokio::test(start_paused = true)]
async fn fetches_fragments_in_order_then_assembles() {
    let loader = ContentLoader::new(three_fragment_page(), LoaderConfig::default());
    let mut doc = Document::new();

    loader.load_all(&mut doc).await.unwrap();

    let requests = loader.source().requests();
    assert_eq!(
        loader.source().paths(),
        vec![
            "fragments/index.txt",
            "/fragments/fragment_0",
            "/fragments/fragment_1",
            "/fragments/fragment_2",
        ]
    );
    assert_eq!(requests[2].1 - requests[1].1, FRAGMENT_DELAY);
    assert_eq!(requests[3].1 - requests[2].1, FRAGMENT_DELAY);

    assert_eq!(doc.progress(), 100.0);
    assert_eq!(doc.loading_message(), "Starting the system...");
    assert_eq!(
        doc.container(),
        r#"<div id="chat"></div><script>start()</script>"#
    );
    assert_eq!(
        doc.head()[0],
        HeadNode::Style {
            text: ".a{color:red}".to_string(),
            dynamic: true
        }
    );
    assert!(matches!(
        &doc.head()[1],
        HeadNode::Script { src: None, text, dynamic: true, .. } if text == "start()"
    ));
    assert_eq!(doc.resize_events(), 1);
    assert_eq!(doc.reflows(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_fragment_is_retried_after_delay() {
    let source = three_fragment_page().with(
        "/fragments/fragment_1",
        [
            Reply::Status(503),
            Reply::Status(503),
            body("dy><div id=\"chat\">"),
        ],
    );
    let loader = ContentLoader::new(source, LoaderConfig::default());
    let mut doc = Document::new();

    loader.load_all(&mut doc).await.unwrap();

    let requests = loader.source().requests();
    let fragment_1: Vec<Instant> = requests
        .iter()
        .filter(|(p, _)| p == "/fragments/fragment_1")
        .map(|(_, at)| *at)
        .collect();
    assert_eq!(fragment_1.len(), 3);
    assert_eq!(fragment_1[1] - fragment_1[0], RETRY_DELAY);
    assert_eq!(fragment_1[2] - fragment_1[1], RETRY_DELAY);
    // Nothing past fragment 1 is requested until it succeeds.
    let first_f2 = requests
        .iter()
        .position(|(p, _)| p == "/fragments/fragment_2")
        .unwrap();
    assert_eq!(first_f2, requests.len() - 1);
    assert!(doc.container().contains("chat"));
}

#[tokio::test(start_paused = true)]
async fn slow_fragment_times_out_and_retries() {
    let source = three_fragment_page().with(
        "/fragments/fragment_0",
        [
            Reply::Slow(Duration::from_secs(30), "late".to_string()),
            body("<p>"),
        ],
    );
    let loader = ContentLoader::new(source, LoaderConfig::default());
    let mut doc = Document::new();

    loader.load_all(&mut doc).await.unwrap();

    let requests = loader.source().requests();
    assert_eq!(requests[1].0, "/fragments/fragment_0");
    assert_eq!(requests[2].0, "/fragments/fragment_0");
    assert_eq!(requests[2].1 - requests[1].1, Duration::from_secs(6));
    assert!(!doc.container().contains("late"));
}

#[tokio::test(start_paused = true)]
async fn bounded_retry_gives_up_with_error_panel() {
    let source = three_fragment_page().with("/fragments/fragment_2", [Reply::Status(500)]);
    let config = LoaderConfig {
        retry: RetryPolicy::bounded(Duration::from_millis(10), 4),
        ..LoaderConfig::default()
    };
    let loader = ContentLoader::new(source, config);
    let mut doc = Document::new();

    let err = loader.load_all(&mut doc).await.unwrap_err();
    assert!(matches!(
        err,
        LoaderError::GaveUp {
            index: 2,
            attempts: 4,
            last: FetchError::Status { status: 500, .. }
        }
    ));
    assert_eq!(doc.container(), ERROR_PANEL);
    assert_eq!(doc.reflows(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_index_stops_before_any_fragment() {
    let loader = ContentLoader::new(ScriptedSource::default(), LoaderConfig::default());
    let mut doc = Document::new();

    let err = loader.load_all(&mut doc).await.unwrap_err();
    assert!(matches!(err, LoaderError::IndexFetch(_)));
    assert_eq!(loader.source().paths(), vec!["fragments/index.txt"]);
    assert_eq!(doc.container(), ERROR_PANEL);
}

#[tokio::test(start_paused = true)]
async fn unparseable_content_shows_error_panel() {
    let source = ScriptedSource::default()
        .with("fragments/index.txt", [body("fragments: 1")])
        .with("/fragments/fragment_0", [body("<p>ok</p><script>cut off")]);
    let loader = ContentLoader::new(source, LoaderConfig::default());
    let mut doc = Document::new();

    let err = loader.load_all(&mut doc).await.unwrap_err();
    assert!(matches!(err, LoaderError::Assemble(_)));
    assert_eq!(doc.container(), ERROR_PANEL);
    assert!(doc.head().is_empty());
}

#[tokio::test(start_paused = true)]
async fn huge_fragment_count_fails_without_allocating() {
    let source = ScriptedSource::default()
        .with("fragments/index.txt", [body("fragments: 18446744073709551615")])
        .with("/fragments/fragment_0", [Reply::Status(500)]);
    let config = LoaderConfig {
        retry: RetryPolicy::bounded(Duration::from_millis(10), 2),
        ..LoaderConfig::default()
    };
    let loader = ContentLoader::new(source, config);
    let mut doc = Document::new();

    let err = loader.load_all(&mut doc).await.unwrap_err();
    assert!(matches!(err, LoaderError::GaveUp { index: 0, .. }));
    assert_eq!(doc.container(), ERROR_PANEL);
}
