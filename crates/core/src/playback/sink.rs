use std::io::Cursor;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;
use url::Url;

use super::{EndedObserver, FailureObserver, PlaybackResource, ResourceProvider};
use crate::{DashError, Result};

/// How often a playing sink is checked for having drained its clip.
const END_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Reads clip bytes from an `http(s)://` URL, a `file://` URL or a local
/// path.
#[derive(Debug, Clone)]
pub struct ClipLoader {
    http: reqwest::Client,
}

impl ClipLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn load(&self, locator: &str) -> Result<Vec<u8>> {
        match Url::parse(locator) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                let response = self.http.get(url).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| DashError::playback(format!("not a local file: {locator}")))?;
                read_file(&path).await
            }
            _ => read_file(Path::new(locator)).await,
        }
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|err| DashError::playback(format!("cannot read {}: {err}", path.display())))
}

fn decode(bytes: Vec<u8>) -> Result<Decoder<Cursor<Vec<u8>>>> {
    Decoder::new(Cursor::new(bytes))
        .map_err(|err| DashError::playback(format!("cannot decode clip: {err}")))
}

/// The default output device. The stream cannot leave the thread that opened
/// it, so it lives on its own thread until the device is dropped.
struct OutputDevice {
    handle: OutputStreamHandle,
    _close: oneshot::Sender<()>,
}

impl OutputDevice {
    fn open_default() -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (close_tx, close_rx) = oneshot::channel::<()>();

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    if ready_tx.send(Ok(handle)).is_ok() {
                        let _ = close_rx.blocking_recv();
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err.to_string()));
                }
            })?;

        let handle = ready_rx
            .recv()
            .map_err(|_| DashError::playback("audio output thread exited"))?
            .map_err(|err| DashError::playback(format!("no audio output device: {err}")))?;

        Ok(Self {
            handle,
            _close: close_tx,
        })
    }
}

/// Plays clips in-process on the default audio output, one [`Sink`] per
/// clip.
pub struct SinkPlayer {
    device: OutputDevice,
    loader: ClipLoader,
}

impl SinkPlayer {
    pub fn open(http: reqwest::Client) -> Result<Self> {
        let device = OutputDevice::open_default()?;
        tracing::debug!("audio output opened");
        Ok(Self {
            device,
            loader: ClipLoader::new(http),
        })
    }
}

impl std::fmt::Debug for SinkPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkPlayer").finish_non_exhaustive()
    }
}

impl ResourceProvider for SinkPlayer {
    fn acquire(&self, locator: &str) -> Result<Arc<dyn PlaybackResource>> {
        let sink = Sink::try_new(&self.device.handle)
            .map_err(|err| DashError::playback(format!("cannot open audio sink: {err}")))?;
        Ok(Arc::new(SinkResource::new(sink, self.loader.clone(), locator)))
    }
}

#[derive(Default)]
struct Inner {
    ended: Option<EndedObserver>,
    started: bool,
    stopped: bool,
}

/// One clip queued on its own sink.
pub struct SinkResource {
    sink: Arc<Sink>,
    loader: ClipLoader,
    locator: String,
    inner: Arc<Mutex<Inner>>,
}

impl SinkResource {
    pub fn new(sink: Sink, loader: ClipLoader, locator: &str) -> Self {
        Self {
            sink: Arc::new(sink),
            loader,
            locator: locator.to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

#[async_trait]
impl PlaybackResource for SinkResource {
    /// Resolves once the clip is decoded and queued. Read and decode
    /// failures reject the start.
    async fn start(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.stopped {
                return Err(DashError::playback("playback interrupted"));
            }
            if inner.started {
                return Err(DashError::playback("clip already started"));
            }
            inner.started = true;
        }

        let bytes = self.loader.load(&self.locator).await?;
        let source = decode(bytes)?;

        {
            // A stopped sink restarts on append, so the check and the append
            // share the lock with `detach_source`.
            let inner = self.inner.lock();
            if inner.stopped {
                return Err(DashError::playback("playback interrupted"));
            }
            self.sink.append(source);
            self.sink.play();
        }
        tracing::debug!(locator = %self.locator, "clip queued");

        tokio::spawn(watch_until_end(self.sink.clone(), self.inner.clone()));
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.sink.pause();
        Ok(())
    }

    fn detach_source(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            inner.stopped = true;
            inner.ended = None;
        }
        self.sink.stop();
        Ok(())
    }

    fn on_ended(&self, observer: EndedObserver) {
        self.inner.lock().ended = Some(observer);
    }

    /// A queued clip cannot fail: the decoder ends the source on a bad
    /// frame, which reads as a natural end.
    fn on_failure(&self, _observer: FailureObserver) {}
}

/// Fires the ended observer once the sink has drained. Returns without
/// notifying once the source is detached.
async fn watch_until_end(sink: Arc<Sink>, inner: Arc<Mutex<Inner>>) {
    let mut interval = tokio::time::interval(END_POLL_INTERVAL);
    loop {
        interval.tick().await;
        if inner.lock().stopped {
            return;
        }
        if sink.empty() {
            break;
        }
    }

    let observer = inner.lock().ended.take();
    if let Some(observer) = observer {
        observer();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::playback::{PlaybackController, PlaybackStatus};

    const RATE: u32 = 8_000;

    /// A mono 16-bit PCM WAV file holding `samples` samples of a ramp.
    fn wav(samples: u32) -> Vec<u8> {
        let data_len = samples * 2;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&RATE.to_le_bytes());
        out.extend_from_slice(&(RATE * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..samples {
            out.extend_from_slice(&((i % 512) as i16 * 64).to_le_bytes());
        }
        out
    }

    fn clip_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn loader() -> ClipLoader {
        ClipLoader::new(reqwest::Client::new())
    }

    /// Pulls samples out of an idle sink's queue the way an output device
    /// would, until dropped.
    struct Drain(Arc<AtomicBool>);

    impl Drain {
        fn start(mut output: impl Iterator<Item = f32> + Send + 'static) -> Self {
            let done = Arc::new(AtomicBool::new(false));
            let flag = done.clone();
            std::thread::spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    for _ in 0..1024 {
                        output.next();
                    }
                    std::thread::yield_now();
                }
            });
            Self(done)
        }
    }

    impl Drop for Drain {
        fn drop(&mut self) {
            self.0.store(true, Ordering::Relaxed);
        }
    }

    fn draining_resource(locator: &str) -> (SinkResource, Drain) {
        let (sink, output) = Sink::new_idle();
        (SinkResource::new(sink, loader(), locator), Drain::start(output))
    }

    #[tokio::test]
    async fn loads_local_paths_and_file_urls() {
        let file = clip_file(b"clip bytes");
        let path = file.path().to_str().unwrap();

        assert_eq!(loader().load(path).await.unwrap(), b"clip bytes");
        let url = Url::from_file_path(file.path()).unwrap();
        assert_eq!(loader().load(url.as_str()).await.unwrap(), b"clip bytes");

        let err = loader().load("/no/such/clip.mp3").await.unwrap_err();
        assert!(err.to_string().starts_with("cannot read /no/such/clip.mp3"));
    }

    #[tokio::test]
    async fn short_clip_plays_to_the_end() {
        let file = clip_file(&wav(RATE / 10));
        let (resource, _drain) = draining_resource(file.path().to_str().unwrap());
        let (ended_tx, ended_rx) = oneshot::channel();
        resource.on_ended(Box::new(move || {
            let _ = ended_tx.send(());
        }));

        resource.start().await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), ended_rx)
            .await
            .expect("clip never ended")
            .unwrap();
        assert!(resource.sink.empty());
    }

    #[tokio::test]
    async fn undecodable_clip_rejects_start() {
        let file = clip_file(b"definitely not audio");
        let (resource, _drain) = draining_resource(file.path().to_str().unwrap());

        let err = resource.start().await.unwrap_err();
        assert!(err.to_string().starts_with("cannot decode clip"), "{err}");
        assert!(resource.sink.empty());
    }

    #[tokio::test]
    async fn starting_twice_is_rejected() {
        let file = clip_file(&wav(RATE));
        let (sink, _output) = Sink::new_idle();
        let resource = SinkResource::new(sink, loader(), file.path().to_str().unwrap());

        resource.start().await.unwrap();
        let err = resource.start().await.unwrap_err();
        assert_eq!(err.to_string(), "clip already started");
        resource.detach_source().unwrap();
    }

    #[tokio::test]
    async fn pause_then_detach_silences_without_notifying() {
        let file = clip_file(&wav(RATE));
        // Nothing pulls from the queue, so the clip stays mid-playback.
        let (sink, _output) = Sink::new_idle();
        let resource = SinkResource::new(sink, loader(), file.path().to_str().unwrap());
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        resource.on_ended(Box::new(move || flag.store(true, Ordering::SeqCst)));

        resource.start().await.unwrap();
        assert!(!resource.sink.empty());

        resource.pause().unwrap();
        assert!(resource.sink.is_paused());
        resource.detach_source().unwrap();

        tokio::time::sleep(END_POLL_INTERVAL * 3).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn detaching_before_start_interrupts_it() {
        let file = clip_file(&wav(RATE));
        let (resource, _drain) = draining_resource(file.path().to_str().unwrap());

        resource.detach_source().unwrap();

        let err = resource.start().await.unwrap_err();
        assert_eq!(err.to_string(), "playback interrupted");
        assert!(resource.sink.empty());
    }

    /// Hands out idle sinks drained by a background thread.
    #[derive(Default)]
    struct IdleSinks {
        drains: parking_lot::Mutex<Vec<Drain>>,
    }

    impl ResourceProvider for IdleSinks {
        fn acquire(&self, locator: &str) -> Result<Arc<dyn PlaybackResource>> {
            let (resource, drain) = draining_resource(locator);
            self.drains.lock().push(drain);
            Ok(Arc::new(resource))
        }
    }

    #[tokio::test]
    async fn controller_returns_to_idle_after_a_clip() {
        let file = clip_file(&wav(RATE / 10));
        let player = PlaybackController::new(IdleSinks::default());
        let mut status = player.subscribe();

        assert!(player.toggle_play("robin", file.path().to_str().unwrap()).await);

        tokio::time::timeout(Duration::from_secs(5), async {
            while status.borrow_and_update().active_key.is_some() {
                status.changed().await.unwrap();
            }
        })
        .await
        .expect("controller never went idle");
        assert_eq!(player.status(), PlaybackStatus::default());
    }

    #[tokio::test]
    async fn controller_reports_decode_failures() {
        let file = clip_file(b"garbage");
        let player = PlaybackController::new(IdleSinks::default());

        assert!(!player.toggle_play("robin", file.path().to_str().unwrap()).await);
        assert!(player
            .last_error()
            .unwrap()
            .starts_with("cannot decode clip"));
    }
}
