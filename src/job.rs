//! Render job: async facade over a worker thread that owns one engine
//!
//! The engine API is synchronous and not `Send`, so each job spawns a
//! dedicated worker thread that launches the engine and executes commands sent
//! from async tasks. The job exclusively owns its browser process: it is never
//! reused or shared, and it is torn down when the job is closed. Dropping the
//! job without closing it sends the close command as a backstop, so an early
//! return or a timeout on the async side can never leak the process.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;

use crate::{EngineConfig, EngineFactory, Error, PdfSettings, Result};

enum Command {
    Navigate(String, oneshot::Sender<Result<()>>),
    PrintPdf(PdfSettings, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// One render job bound to one engine instance
#[derive(Debug)]
pub struct RenderJob {
    cmd_tx: Sender<Command>,
}

impl RenderJob {
    /// Spawn a worker thread and launch a fresh engine on it.
    ///
    /// Returns once the engine has been launched, or with the launch error if
    /// it failed (in which case no worker or process remains).
    pub async fn spawn(factory: Arc<dyn EngineFactory>, config: EngineConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Launch the engine on the worker thread; it never crosses threads
            let mut engine = match factory.launch(&config) {
                Ok(e) => e,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            // Command loop; the engine is dropped (and the browser process
            // with it) when the loop exits, whether by Close or because the
            // job handle went away.
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Navigate(url, resp) => {
                        let _ = resp.send(engine.navigate(&url));
                    }
                    Command::PrintPdf(settings, resp) => {
                        let _ = resp.send(engine.print_pdf(&settings));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(engine.close());
                        break;
                    }
                }
            }
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::InitializationError(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Navigate the job's page to a URL
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Navigate(url.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("Navigate canceled: {}", e)))?
    }

    /// Capture the current page as a PDF
    pub async fn print_pdf(&self, settings: &PdfSettings) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::PrintPdf(settings.clone(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("PrintPdf canceled: {}", e)))?
    }

    /// Close the job, terminating the engine and its browser process
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}

impl Drop for RenderJob {
    fn drop(&mut self) {
        // Best effort: if the job is dropped without close(), ask the worker
        // to shut down. The worker also exits once the channel is gone, so
        // the engine cannot outlive the job either way.
        let (tx, _rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, MarginMode, PageFormat};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingEngine {
        open: Arc<AtomicUsize>,
    }

    impl Drop for CountingEngine {
        fn drop(&mut self) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl Engine for CountingEngine {
        fn navigate(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }

        fn print_pdf(&self, _settings: &PdfSettings) -> Result<Vec<u8>> {
            Ok(b"%PDF-1.4 counting".to_vec())
        }

        fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    struct CountingFactory {
        open: Arc<AtomicUsize>,
        fail: bool,
    }

    impl EngineFactory for CountingFactory {
        fn launch(&self, _config: &EngineConfig) -> Result<Box<dyn Engine>> {
            if self.fail {
                return Err(Error::InitializationError("no browser here".to_string()));
            }
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingEngine {
                open: self.open.clone(),
            }))
        }
    }

    fn settings() -> PdfSettings {
        PdfSettings {
            format: PageFormat::A4,
            landscape: false,
            print_background: true,
            margin: MarginMode::Default,
        }
    }

    async fn wait_for_zero(open: &Arc<AtomicUsize>) {
        for _ in 0..100 {
            if open.load(Ordering::SeqCst) == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("engine leaked: {} still open", open.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_full_job_lifecycle() {
        let open = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            open: open.clone(),
            fail: false,
        });

        let job = RenderJob::spawn(factory, EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(open.load(Ordering::SeqCst), 1);

        job.navigate("https://example.com").await.unwrap();
        let bytes = job.print_pdf(&settings()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        job.close().await.unwrap();
        wait_for_zero(&open).await;
    }

    #[tokio::test]
    async fn test_spawn_failure_leaves_nothing_open() {
        let open = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            open: open.clone(),
            fail: true,
        });

        let err = RenderJob::spawn(factory, EngineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InitializationError(_)));
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_drop_without_close_tears_down_engine() {
        let open = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            open: open.clone(),
            fail: false,
        });

        let job = RenderJob::spawn(factory, EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(open.load(Ordering::SeqCst), 1);

        drop(job);
        wait_for_zero(&open).await;
    }
}
