use std::mem::swap;
use std::sync::Arc;
use std::time::Duration;

use scotty_core::ControllerOptions;
use scotty_core::HttpBackend;
use scotty_core::PageContext;
use scotty_core::PollTick;
use scotty_core::ViewController;
use scotty_core::config::Config;
use scotty_core::poll_channel;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::RecordingView;
use crate::load_default_config_for_test;

type ConfigMutator = dyn FnOnce(&mut Config);

pub struct TestScottyBuilder {
    config_mutators: Vec<Box<ConfigMutator>>,
}

impl TestScottyBuilder {
    pub fn with_config<T>(mut self, mutator: T) -> Self
    where
        T: FnOnce(&mut Config) + 'static,
    {
        self.config_mutators.push(Box::new(mutator));
        self
    }

    /// Build a controller talking to `server` and run its initialization for
    /// `page`.
    pub async fn build(
        &mut self,
        server: &wiremock::MockServer,
        page: PageContext,
    ) -> anyhow::Result<TestScotty> {
        let home = TempDir::new()?;
        let mut config = load_default_config_for_test(&home, &server.uri());
        let mut mutators = vec![];
        swap(&mut self.config_mutators, &mut mutators);
        for mutator in mutators {
            mutator(&mut config)
        }

        let backend = Arc::new(HttpBackend::new(&config));
        let (poll_tx, poll_rx) = poll_channel();
        let mut controller = ViewController::new(
            backend,
            RecordingView::default(),
            poll_tx,
            ControllerOptions::from(&config),
        );
        controller.initialize(page).await;

        Ok(TestScotty {
            home,
            config,
            controller,
            poll_rx,
        })
    }
}

pub struct TestScotty {
    pub home: TempDir,
    pub config: Config,
    pub controller: ViewController<RecordingView>,
    pub poll_rx: mpsc::Receiver<PollTick>,
}

impl TestScotty {
    /// Wait for the poller's next tick and hand it to the controller, the
    /// way the front-end event loop does.
    pub async fn next_poll(&mut self) -> anyhow::Result<()> {
        let tick = tokio::time::timeout(Duration::from_secs(5), self.poll_rx.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("poll channel closed"))?;
        self.controller.on_poll_tick(tick).await;
        Ok(())
    }
}

pub fn test_scotty() -> TestScottyBuilder {
    TestScottyBuilder {
        config_mutators: vec![],
    }
}
