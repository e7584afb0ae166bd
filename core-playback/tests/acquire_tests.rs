//! Acquisition pipeline against mocked HTTP and remux seams.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, HttpStream, RetryPolicy};
use bridge_traits::process::{MediaRemuxer, RemuxOutput};
use core_async::sync::CancellationToken;
use core_fetch::FetchClient;
use core_library::{CanonicalTrack, Platform, ResolvedTrackInfo};
use core_playback::acquire::decrypt::{decrypt_in_place, TrackKey};
use core_playback::{AcquireConfig, PlaybackError, TrackAcquirer};
use core_runtime::ErrorKind;
use mockall::mock;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn open_stream(&self, request: HttpRequest) -> BridgeResult<HttpStream>;
    }
}

mock! {
    pub Remuxer {}

    #[async_trait]
    impl MediaRemuxer for Remuxer {
        async fn remux(&self, input: &Path, output: &Path) -> BridgeResult<RemuxOutput>;
    }
}

/// Remux that never finishes; counts invocations.
#[derive(Default)]
struct HangingRemuxer {
    calls: AtomicUsize,
}

#[async_trait]
impl MediaRemuxer for HangingRemuxer {
    async fn remux(&self, _input: &Path, _output: &Path) -> BridgeResult<RemuxOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(RemuxOutput {
            exit_code: Some(0),
            stderr: String::new(),
        })
    }
}

const KEY: &str = "00112233445566778899aabbccddeeff";

fn plain_track(id: &str) -> Vec<u8> {
    (0..4096u32)
        .map(|i| (i.wrapping_mul(31) % 256) as u8)
        .chain(id.bytes())
        .collect()
}

fn info(id: &str, key: Option<&str>) -> ResolvedTrackInfo {
    ResolvedTrackInfo {
        track: CanonicalTrack {
            id: id.to_string(),
            name: "Song".to_string(),
            artist: "Artist".to_string(),
            album: None,
            cover_url: None,
            duration_seconds: 100,
            year: None,
            platform: Platform::Spotify,
            source_url: format!("https://open.spotify.com/track/{}", id),
        },
        cdn_url: Some(format!("https://cdn.test/{}", id)),
        decryption_key: key.map(str::to_string),
        lyrics: None,
        local_file: None,
    }
}

fn stream_of(body: Vec<u8>) -> HttpStream {
    HttpStream {
        status: 200,
        headers: Default::default(),
        body: Box::new(Cursor::new(body)),
    }
}

fn encrypted_body(id: &str) -> Vec<u8> {
    let mut data = plain_track(id);
    decrypt_in_place(&TrackKey::from_hex(id, KEY).unwrap(), &mut data);
    data
}

fn copying_remuxer(times: usize) -> MockRemuxer {
    let mut remuxer = MockRemuxer::new();
    remuxer
        .expect_remux()
        .times(times)
        .returning(|input, output| {
            std::fs::copy(input, output).unwrap();
            Ok(RemuxOutput {
                exit_code: Some(0),
                stderr: String::new(),
            })
        });
    remuxer
}

fn acquirer(
    http: MockHttp,
    remuxer: Arc<dyn MediaRemuxer>,
    dir: &TempDir,
    remux_timeout: Duration,
) -> TrackAcquirer {
    let policy = RetryPolicy {
        max_attempts: 1,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
        use_exponential_backoff: true,
    };
    let fetch = FetchClient::new(Arc::new(http), policy, dir.path());
    let config = AcquireConfig::new(dir.path())
        .with_remux_timeout(remux_timeout)
        .with_max_concurrent(4);
    TrackAcquirer::new(fetch, remuxer, config)
}

fn leftovers(dir: &TempDir) -> Vec<PathBuf> {
    let mut names: Vec<PathBuf> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| PathBuf::from(e.unwrap().file_name()))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_plain_track_is_downloaded_once() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream()
        .withf(|req| req.url == "https://cdn.test/plain1")
        .times(1)
        .returning(|_| Ok(stream_of(plain_track("plain1"))));
    let mut remuxer = MockRemuxer::new();
    remuxer.expect_remux().never();

    let acquirer = acquirer(http, Arc::new(remuxer), &dir, Duration::from_secs(5));
    let track = info("plain1", None);

    let first = acquirer.acquire(&track).await.unwrap();
    let second = acquirer.acquire(&track).await.unwrap();

    assert_eq!(first, dir.path().join("plain1.mp3"));
    assert_eq!(first, second);
    assert_eq!(std::fs::read(&first).unwrap(), plain_track("plain1"));
    assert_eq!(leftovers(&dir), [PathBuf::from("plain1.mp3")]);
}

#[tokio::test]
async fn test_encrypted_track_is_decrypted_repaired_and_remuxed() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream()
        .times(1)
        .returning(|_| Ok(stream_of(encrypted_body("enc1"))));

    let acquirer = acquirer(http, Arc::new(copying_remuxer(1)), &dir, Duration::from_secs(5));
    let path = acquirer.acquire(&info("enc1", Some(KEY))).await.unwrap();

    assert_eq!(path, dir.path().join("enc1.ogg"));
    let output = std::fs::read(&path).unwrap();
    let plain = plain_track("enc1");
    assert_eq!(output.len(), plain.len());
    assert_eq!(&output[..4], b"OggS");
    assert_eq!(&output[26..35], b"\x01\x1e\x01vorbis");
    assert_eq!(&output[58..62], b"OggS");
    assert_eq!(&output[72..], &plain[72..]);

    // Intermediates are gone.
    assert_eq!(leftovers(&dir), [PathBuf::from("enc1.ogg")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquisitions_remux_once() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream()
        .times(1)
        .returning(|_| Ok(stream_of(encrypted_body("dup1"))));

    let acquirer = Arc::new(acquirer(
        http,
        Arc::new(copying_remuxer(1)),
        &dir,
        Duration::from_secs(5),
    ));
    let track = info("dup1", Some(KEY));

    let (a, b) = tokio::join!(acquirer.acquire(&track), acquirer.acquire(&track));

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a, b);
    assert_eq!(a, dir.path().join("dup1.ogg"));
}

#[tokio::test]
async fn test_missing_source_fails_without_network() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream().never();
    let acquirer = acquirer(http, Arc::new(MockRemuxer::new()), &dir, Duration::from_secs(5));

    let mut track = info("nocdn", None);
    track.cdn_url = Some("   ".to_string());

    let err = acquirer.acquire(&track).await.unwrap_err();
    assert!(matches!(err, PlaybackError::MissingSource(_)));
    assert_eq!(err.kind(), ErrorKind::Media);
}

#[tokio::test]
async fn test_invalid_key_fails_before_download() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream().never();
    let acquirer = acquirer(http, Arc::new(MockRemuxer::new()), &dir, Duration::from_secs(5));

    let err = acquirer
        .acquire(&info("badkey", Some("not-hex")))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidKey { .. }));
}

#[tokio::test]
async fn test_remux_failure_cleans_up() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream()
        .returning(|_| Ok(stream_of(encrypted_body("fail1"))));
    let mut remuxer = MockRemuxer::new();
    remuxer.expect_remux().times(1).returning(|_, output| {
        std::fs::write(output, b"half written").unwrap();
        Ok(RemuxOutput {
            exit_code: Some(1),
            stderr: "Invalid data found when processing input\n".to_string(),
        })
    });

    let acquirer = acquirer(http, Arc::new(remuxer), &dir, Duration::from_secs(5));
    let err = acquirer.acquire(&info("fail1", Some(KEY))).await.unwrap_err();

    match err {
        PlaybackError::Remux { code, stderr } => {
            assert_eq!(code, Some(1));
            assert_eq!(stderr, "Invalid data found when processing input");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(leftovers(&dir).is_empty());
}

#[tokio::test]
async fn test_hung_remux_times_out() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream()
        .returning(|_| Ok(stream_of(encrypted_body("hang1"))));
    let remuxer = Arc::new(HangingRemuxer::default());

    let acquirer = acquirer(http, remuxer.clone(), &dir, Duration::from_millis(200));
    let err = acquirer.acquire(&info("hang1", Some(KEY))).await.unwrap_err();

    assert!(matches!(err, PlaybackError::RemuxTimeout(_)));
    assert_eq!(remuxer.calls.load(Ordering::SeqCst), 1);
    assert!(leftovers(&dir).is_empty());
}

#[tokio::test]
async fn test_cancelled_acquisition_is_abandoned() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream()
        .returning(|_| Ok(stream_of(encrypted_body("stop1"))));
    let remuxer = Arc::new(HangingRemuxer::default());
    let acquirer = acquirer(http, remuxer.clone(), &dir, Duration::from_secs(60));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = acquirer
        .acquire_cancellable(&info("stop1", Some(KEY)), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::Cancelled));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(leftovers(&dir).is_empty());
}

#[tokio::test]
async fn test_local_file_from_lookup_is_reused() {
    let dir = TempDir::new().unwrap();
    let stored = dir.path().join("direct1.mp3");
    std::fs::write(&stored, b"ID3").unwrap();

    let mut http = MockHttp::new();
    http.expect_open_stream().never();
    let acquirer = acquirer(http, Arc::new(MockRemuxer::new()), &dir, Duration::from_secs(5));

    let mut track = info("direct1", None);
    track.cdn_url = None;
    track.local_file = Some(stored.clone());

    assert_eq!(acquirer.acquire(&track).await.unwrap(), stored);
}

#[tokio::test]
async fn test_download_error_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let mut http = MockHttp::new();
    http.expect_open_stream().returning(|_| {
        Ok(HttpStream {
            status: 403,
            headers: Default::default(),
            body: Box::new(Cursor::new(b"{\"error\":\"expired token\"}".to_vec())),
        })
    });
    let acquirer = acquirer(http, Arc::new(MockRemuxer::new()), &dir, Duration::from_secs(5));

    let err = acquirer.acquire(&info("denied1", None)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(err.to_string().contains("expired token"));
    assert!(leftovers(&dir).is_empty());
}
