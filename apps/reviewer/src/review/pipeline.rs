//! Review Pipeline: preprocess → prompt → complete → validate for one document.
//!
//! Platform-agnostic; the bot adapter owns transport and rendering.

use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::document::{
    analyze_font_consistency, DocumentPreprocessor, ExtractedDocument, FontConsistencyReport,
    ReferenceDocument,
};
use crate::errors::ReviewError;
use crate::llm_client::{ContentBlock, LlmClient, Message};
use crate::review::builder::{ExtendedInputs, JobContext, ReviewPrompts};
use crate::review::models::ReviewResult;
use crate::review::schema::parse_feedback;

const MAX_TOKENS: u32 = 8192;
const TEMPERATURE: f32 = 0.25;

/// Everything the extended prompt needs from the user's document.
struct PreparedDocument {
    image_base64: String,
    extracted: ExtractedDocument,
    single_page: bool,
    fonts: FontConsistencyReport,
}

/// Shared, read-only review machinery. Cheap to clone.
#[derive(Clone)]
pub struct ReviewPipeline {
    llm: LlmClient,
    preprocessor: Arc<dyn DocumentPreprocessor>,
    reference: Option<Arc<ReferenceDocument>>,
}

impl ReviewPipeline {
    pub fn new(llm: LlmClient, preprocessor: Arc<dyn DocumentPreprocessor>) -> Self {
        Self {
            llm,
            preprocessor,
            reference: None,
        }
    }

    /// Enables the extended review, comparing formatting against `reference`.
    pub fn with_reference(mut self, reference: ReferenceDocument) -> Self {
        self.reference = Some(Arc::new(reference));
        self
    }

    pub fn is_extended(&self) -> bool {
        self.reference.is_some()
    }

    /// Reviews one PDF. Each call is an independent run with its own review id.
    pub async fn review(
        &self,
        document: Bytes,
        job: &JobContext,
    ) -> Result<ReviewResult, ReviewError> {
        let review_id = Uuid::new_v4();
        let span = info_span!(
            "review",
            %review_id,
            backend = self.preprocessor.backend_name(),
            extended = self.is_extended()
        );

        async move {
            info!(
                "Reviewing {} byte document for {} at {}",
                document.len(),
                job.job_title(),
                job.company()
            );
            let result = match &self.reference {
                Some(reference) => self.review_extended(document, job, reference).await,
                None => self.review_basic(document, job).await,
            }?;
            info!(
                "Review complete: {} experience(s), {} project(s), {} bullet(s)",
                result.experiences.len(),
                result.projects.len(),
                result.bullets().count()
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    async fn review_basic(
        &self,
        document: Bytes,
        job: &JobContext,
    ) -> Result<ReviewResult, ReviewError> {
        let image = self
            .run_blocking(document, |preprocessor, pdf| preprocessor.convert_to_image(pdf))
            .await?;

        let prompts = ReviewPrompts::basic(job);
        let messages = vec![Message::user(vec![
            ContentBlock::text(prompts.user),
            ContentBlock::png_base64(image),
        ])];

        self.complete(messages, &prompts.system).await
    }

    async fn review_extended(
        &self,
        document: Bytes,
        job: &JobContext,
        reference: &ReferenceDocument,
    ) -> Result<ReviewResult, ReviewError> {
        let prepared = self
            .run_blocking(document, |preprocessor, pdf| {
                let extracted = preprocessor.extract_text_and_formatting(pdf)?;
                let fonts = analyze_font_consistency(&extracted.formatting);
                Ok(PreparedDocument {
                    image_base64: preprocessor.convert_to_image(pdf)?,
                    single_page: preprocessor.check_single_page(pdf)?,
                    extracted,
                    fonts,
                })
            })
            .await?;
        info!(
            "Prepared document: {} text line(s), {} styled run(s), single_page={}",
            prepared.extracted.text.len(),
            prepared.extracted.formatting.len(),
            prepared.single_page
        );

        let prompts = ReviewPrompts::extended(ExtendedInputs {
            job,
            single_page: prepared.single_page,
            document: &prepared.extracted,
            fonts: &prepared.fonts,
            reference: &reference.extracted,
        })?;
        let messages = vec![Message::user(vec![
            ContentBlock::text("Here is the user's resume: "),
            ContentBlock::png_base64(prepared.image_base64),
            ContentBlock::text("Here is the default resume: "),
            ContentBlock::png_base64(reference.image_base64.clone()),
            ContentBlock::text(prompts.user),
        ])];

        let result = self.complete(messages, &prompts.system).await?;
        if result.formatting.is_none() {
            warn!("Extended review returned no formatting section");
        }
        Ok(result)
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        system: &str,
    ) -> Result<ReviewResult, ReviewError> {
        let completion = self
            .llm
            .get_chat_completion(MAX_TOKENS, messages, Some(system), Some(TEMPERATURE))
            .await?;
        parse_feedback(&completion)
    }

    /// Runs preprocessing on the blocking pool; poppler subprocesses and PDF
    /// parsing must not stall the event loop.
    async fn run_blocking<T, F>(&self, document: Bytes, f: F) -> Result<T, ReviewError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentPreprocessor, &[u8]) -> Result<T, ReviewError> + Send + 'static,
    {
        let preprocessor = Arc::clone(&self.preprocessor);
        tokio::task::spawn_blocking(move || f(preprocessor.as_ref(), &document))
            .await
            .context("Document preprocessing task panicked")?
    }
}
