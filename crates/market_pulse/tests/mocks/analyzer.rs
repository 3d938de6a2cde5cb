use std::sync::{Arc, Mutex};

use market_pulse::{domain::AnalysisBatch, MarketAnalyzer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerCall {
    Manual(Vec<String>),
    Scheduled(String, usize),
}

/// Stand-in for the whole pipeline, for exercising jobs and routes.
#[derive(Clone, Default)]
pub struct MockAnalyzer {
    pub batch: AnalysisBatch,
    pub calls: Arc<Mutex<Vec<AnalyzerCall>>>,
    pub fail_with: Option<String>,
    pub panic_with: Option<String>,
}

impl MockAnalyzer {
    pub fn new(batch: AnalysisBatch) -> Self {
        Self {
            batch,
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn panicking(msg: &str) -> Self {
        Self {
            panic_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    fn outcome(&self) -> anyhow::Result<AnalysisBatch> {
        if let Some(ref msg) = self.panic_with {
            panic!("{}", msg);
        }
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.batch.clone())
    }
}

impl MarketAnalyzer for MockAnalyzer {
    async fn run_manual(&self, urls: &[String]) -> anyhow::Result<AnalysisBatch> {
        self.calls
            .lock()
            .unwrap()
            .push(AnalyzerCall::Manual(urls.to_vec()));
        self.outcome()
    }

    async fn run_scheduled(
        &self,
        channel_handle: &str,
        max_videos: usize,
    ) -> anyhow::Result<AnalysisBatch> {
        self.calls
            .lock()
            .unwrap()
            .push(AnalyzerCall::Scheduled(channel_handle.to_string(), max_videos));
        self.outcome()
    }
}
