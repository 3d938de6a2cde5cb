use std::path::PathBuf;

use crate::{
    llm::prompt::DEFAULT_TRANSCRIPT_CHAR_LIMIT,
    yt::{AudioHandler, ChannelScraper, MetadataSource, TranscriptSource},
    MarketNewsProcessor, Summarizer,
};

pub struct MarketNewsProcessorBuilder<P = (), M = (), T = (), A = (), S = ()> {
    workdir: PathBuf,
    transcript_char_limit: usize,
    channel_scraper: P,
    metadata_source: M,
    transcript_source: T,
    audio_handler: A,
    summarizer: S,
}

impl MarketNewsProcessorBuilder {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            transcript_char_limit: DEFAULT_TRANSCRIPT_CHAR_LIMIT,
            channel_scraper: (),
            metadata_source: (),
            transcript_source: (),
            audio_handler: (),
            summarizer: (),
        }
    }
}

impl<P, M, T, A, S> MarketNewsProcessorBuilder<P, M, T, A, S> {
    pub fn channel_scraper<P2: ChannelScraper + Send + Sync + 'static>(
        self,
        channel_scraper: P2,
    ) -> MarketNewsProcessorBuilder<P2, M, T, A, S> {
        MarketNewsProcessorBuilder {
            workdir: self.workdir,
            transcript_char_limit: self.transcript_char_limit,
            channel_scraper,
            metadata_source: self.metadata_source,
            transcript_source: self.transcript_source,
            audio_handler: self.audio_handler,
            summarizer: self.summarizer,
        }
    }

    pub fn metadata_source<M2: MetadataSource + Send + Sync + 'static>(
        self,
        metadata_source: M2,
    ) -> MarketNewsProcessorBuilder<P, M2, T, A, S> {
        MarketNewsProcessorBuilder {
            workdir: self.workdir,
            transcript_char_limit: self.transcript_char_limit,
            channel_scraper: self.channel_scraper,
            metadata_source,
            transcript_source: self.transcript_source,
            audio_handler: self.audio_handler,
            summarizer: self.summarizer,
        }
    }

    pub fn transcript_source<T2: TranscriptSource + Send + Sync + 'static>(
        self,
        transcript_source: T2,
    ) -> MarketNewsProcessorBuilder<P, M, T2, A, S> {
        MarketNewsProcessorBuilder {
            workdir: self.workdir,
            transcript_char_limit: self.transcript_char_limit,
            channel_scraper: self.channel_scraper,
            metadata_source: self.metadata_source,
            transcript_source,
            audio_handler: self.audio_handler,
            summarizer: self.summarizer,
        }
    }

    pub fn audio_handler<A2: AudioHandler + Send + Sync + 'static>(
        self,
        audio_handler: A2,
    ) -> MarketNewsProcessorBuilder<P, M, T, A2, S> {
        MarketNewsProcessorBuilder {
            workdir: self.workdir,
            transcript_char_limit: self.transcript_char_limit,
            channel_scraper: self.channel_scraper,
            metadata_source: self.metadata_source,
            transcript_source: self.transcript_source,
            audio_handler,
            summarizer: self.summarizer,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> MarketNewsProcessorBuilder<P, M, T, A, S2> {
        MarketNewsProcessorBuilder {
            workdir: self.workdir,
            transcript_char_limit: self.transcript_char_limit,
            channel_scraper: self.channel_scraper,
            metadata_source: self.metadata_source,
            transcript_source: self.transcript_source,
            audio_handler: self.audio_handler,
            summarizer,
        }
    }

    /// Characters of transcript kept in the text prompt.
    pub fn transcript_char_limit(mut self, limit: usize) -> Self {
        self.transcript_char_limit = limit;
        self
    }
}

impl<P, M, T, A, S> MarketNewsProcessorBuilder<P, M, T, A, S>
where
    P: ChannelScraper + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    pub fn build(self) -> MarketNewsProcessor<P, M, T, A, S> {
        MarketNewsProcessor {
            workdir: self.workdir,
            transcript_char_limit: self.transcript_char_limit,
            channel_scraper: self.channel_scraper,
            metadata_source: self.metadata_source,
            transcript_source: self.transcript_source,
            audio_handler: self.audio_handler,
            summarizer: self.summarizer,
        }
    }
}
