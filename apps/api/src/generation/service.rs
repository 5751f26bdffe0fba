//! Generation pipeline: normalize → fingerprint → cache lookup → workspace →
//! compile → store, with a fallback error PDF when compilation fails.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::{fingerprint, ArtifactKind, CacheManager, CacheStats, CachedArtifact};
use crate::compile::{fallback::create_fallback_pdf, CompilerStatus, DocumentCompiler};
use crate::errors::AppError;
use crate::generation::{generator::CvGenerator, styles::Style};
use crate::resume::{normalize, RawInput, ResumeRecord};

/// Name of the main document inside a workspace.
pub const DOCUMENT_NAME: &str = "resume";
/// Fallback PDF kept in the workspace of a failed job.
pub const FALLBACK_FILE: &str = "fallback.pdf";
/// Job workspaces left on disk (failed jobs) are swept after this long.
pub const WORKSPACE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Minimum time between two workspace sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub key: String,
    pub job_id: Uuid,
    /// Cache-owned file, or the workspace fallback PDF when `fallback` is set.
    #[serde(skip)]
    pub artifact: PathBuf,
    pub kind: ArtifactKind,
    pub cached: bool,
    pub fallback: bool,
}

pub struct GenerationService {
    generator: CvGenerator,
    compiler: Arc<dyn DocumentCompiler>,
    cache: Mutex<CacheManager>,
    output_dir: PathBuf,
    fallback_timeout: Duration,
    last_sweep: Mutex<Option<SystemTime>>,
}

impl GenerationService {
    pub fn new(
        generator: CvGenerator,
        compiler: Arc<dyn DocumentCompiler>,
        cache: CacheManager,
        output_dir: PathBuf,
        fallback_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            compiler,
            cache: Mutex::new(cache),
            output_dir,
            fallback_timeout,
            last_sweep: Mutex::new(None),
        }
    }

    /// Normalizes `input` and generates it with the named theme.
    pub async fn generate(
        &self,
        input: RawInput<'_>,
        style: &str,
        compile: bool,
    ) -> Result<GenerationOutcome, AppError> {
        let style = Style::lookup(style)
            .ok_or_else(|| AppError::invalid(format!("Invalid style: {style}")))?;
        let record = normalize(input)?;
        self.generate_record(&record, &style, compile).await
    }

    /// Generates an already normalized record.
    ///
    /// The cache lock is held for the whole request, so concurrent requests run
    /// one at a time against the cache and the compiler.
    pub async fn generate_record(
        &self,
        record: &ResumeRecord,
        style: &Style,
        compile: bool,
    ) -> Result<GenerationOutcome, AppError> {
        let kind = if compile {
            ArtifactKind::Pdf
        } else {
            ArtifactKind::Latex
        };
        // One entry per kind, so a LaTeX request never replaces the PDF.
        let key = format!("{}-{kind}", fingerprint(record, style.name)?);
        let job_id = Uuid::new_v4();

        self.maybe_sweep_workspaces(SystemTime::now()).await;

        let mut cache = self.cache.lock().await;
        if let Some(hit) = cache.get(&key)? {
            if hit.kind == kind {
                info!("Serving {key} ({kind}, style {}) from cache", style.name);
                return Ok(GenerationOutcome {
                    key,
                    job_id,
                    artifact: hit.path,
                    kind,
                    cached: true,
                    fallback: false,
                });
            }
        }

        let workspace = self.output_dir.join(job_id.to_string());
        let source = match self
            .generator
            .write_workspace(record, style, &workspace, DOCUMENT_NAME)
            .await
        {
            Ok(source) => source,
            Err(err) => {
                remove_workspace(&workspace).await;
                return Err(err);
            }
        };

        let produced = if compile {
            match self.compiler.compile(&source).await {
                Ok(pdf) => pdf,
                Err(err) => {
                    drop(cache);
                    return self.recover(key, job_id, &workspace, err).await;
                }
            }
        } else {
            source
        };

        let stored = cache.put(&key, &produced, kind);
        drop(cache);
        remove_workspace(&workspace).await;
        let artifact = stored?;

        info!("Generated {key} ({kind}, style {}) in job {job_id}", style.name);
        Ok(GenerationOutcome {
            key,
            job_id,
            artifact,
            kind,
            cached: false,
            fallback: false,
        })
    }

    /// Replaces a failed compile with the error PDF. The original error is
    /// surfaced only if the fallback cannot be produced either.
    async fn recover(
        &self,
        key: String,
        job_id: Uuid,
        workspace: &Path,
        err: AppError,
    ) -> Result<GenerationOutcome, AppError> {
        let message = err.user_message();
        let output = workspace.join(FALLBACK_FILE);

        match create_fallback_pdf(
            self.compiler.as_ref(),
            &output,
            &message,
            self.fallback_timeout,
        )
        .await
        {
            Ok(()) => {
                warn!("Compilation failed for job {job_id}; serving fallback PDF");
                Ok(GenerationOutcome {
                    key,
                    job_id,
                    artifact: output,
                    kind: ArtifactKind::Pdf,
                    cached: false,
                    fallback: true,
                })
            }
            Err(fallback_err) => {
                error!("Fallback PDF failed for job {job_id}: {fallback_err}");
                remove_workspace(workspace).await;
                Err(err)
            }
        }
    }

    /// Generates `record` once per standard theme. Failures are logged and skipped.
    pub async fn generate_all_styles(
        &self,
        record: &ResumeRecord,
    ) -> Vec<(&'static str, GenerationOutcome)> {
        let mut outcomes = Vec::new();
        for style in Style::standard() {
            match self.generate_record(record, &style, true).await {
                Ok(outcome) => outcomes.push((style.name, outcome)),
                Err(e) => error!("Generation with style {} failed: {e}", style.name),
            }
        }
        outcomes
    }

    /// Removes job workspaces older than [`WORKSPACE_TTL`]. Only directories
    /// named by a job id are touched. Returns how many were removed.
    pub async fn sweep_workspaces(&self, now: SystemTime) -> Result<usize, AppError> {
        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let is_job = entry
                .file_name()
                .to_str()
                .is_some_and(|name| Uuid::parse_str(name).is_ok());
            if !is_job || !entry.file_type().await?.is_dir() {
                continue;
            }
            let modified = entry.metadata().await?.modified()?;
            if now.duration_since(modified).unwrap_or_default() >= WORKSPACE_TTL {
                tokio::fs::remove_dir_all(entry.path()).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Swept {removed} stale workspace(s) from {}", self.output_dir.display());
        }
        Ok(removed)
    }

    /// Runs [`Self::sweep_workspaces`] at most once per [`SWEEP_INTERVAL`].
    async fn maybe_sweep_workspaces(&self, now: SystemTime) {
        let mut last = self.last_sweep.lock().await;
        let due = last.map_or(true, |at| {
            now.duration_since(at).unwrap_or_default() >= SWEEP_INTERVAL
        });
        if !due {
            return;
        }
        *last = Some(now);
        if let Err(e) = self.sweep_workspaces(now).await {
            warn!("Workspace sweep failed: {e}");
        }
    }

    pub async fn cached_artifact(&self, key: &str) -> Result<Option<CachedArtifact>, AppError> {
        self.cache.lock().await.get(key)
    }

    /// Drops one artifact from the cache. Returns false if it was not cached.
    pub async fn remove_artifact(&self, key: &str) -> Result<bool, AppError> {
        self.cache.lock().await.remove(key)
    }

    /// Path of the fallback PDF for a failed job, if one was written.
    pub fn fallback_path(&self, job_id: Uuid) -> Option<PathBuf> {
        let path = self
            .output_dir
            .join(job_id.to_string())
            .join(FALLBACK_FILE);
        path.is_file().then_some(path)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    pub async fn clear_cache(&self) -> Result<(), AppError> {
        self.cache.lock().await.clear()
    }

    pub async fn compiler_status(&self) -> CompilerStatus {
        self.compiler.probe().await
    }
}

async fn remove_workspace(workspace: &Path) {
    match tokio::fs::remove_dir_all(workspace).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove workspace {}: {e}", workspace.display()),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::compile::stub::StubMode;

    #[tokio::test]
    async fn test_compiles_and_caches_pdf() {
        let h = harness(StubMode::Succeed);
        let outcome = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();

        assert!(!outcome.cached);
        assert!(!outcome.fallback);
        assert_eq!(outcome.kind, ArtifactKind::Pdf);
        let bytes = tokio::fs::read(&outcome.artifact).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        // The workspace is gone once the artifact is stored.
        let workspace = h.root.path().join("output").join(outcome.job_id.to_string());
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_second_request_is_a_cache_hit() {
        let h = harness(StubMode::Succeed);
        let first = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();
        let second = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();

        assert!(second.cached);
        assert_eq!(first.key, second.key);
        assert_eq!(h.compiler.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_requires_matching_kind() {
        let h = harness(StubMode::Succeed);
        let latex = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", false)
            .await
            .unwrap();
        assert_eq!(latex.kind, ArtifactKind::Latex);
        assert_eq!(h.compiler.calls(), 0);

        let pdf = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();
        assert!(!pdf.cached);
        assert_eq!(pdf.kind, ArtifactKind::Pdf);
    }

    #[tokio::test]
    async fn test_style_changes_key() {
        let h = harness(StubMode::Succeed);
        let red = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", false)
            .await
            .unwrap();
        let navy = h
            .service
            .generate(RawInput::Json(ADA_JSON), "navy", false)
            .await
            .unwrap();
        assert_ne!(red.key, navy.key);
    }

    #[tokio::test]
    async fn test_unknown_style_is_rejected() {
        let h = harness(StubMode::Succeed);
        let err = h
            .service
            .generate(RawInput::Json(ADA_JSON), "plaid", true)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => assert_eq!(errors, vec!["Invalid style: plaid"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_compile_failure_produces_uncached_fallback() {
        let h = harness(StubMode::FailDocuments);
        let outcome = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();

        assert!(outcome.fallback);
        assert!(!outcome.cached);
        assert_eq!(h.service.fallback_path(outcome.job_id), Some(outcome.artifact.clone()));
        let text = String::from_utf8_lossy(&tokio::fs::read(&outcome.artifact).await.unwrap())
            .to_string();
        assert!(text.contains("Undefined control sequence"));

        assert_eq!(h.service.cache_stats().await.entry_count, 0);
        assert!(h.service.cached_artifact(&outcome.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_fallback_surfaces_compile_error() {
        let h = harness(StubMode::FailAll);
        let err = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Compilation(_)));
    }

    fn job_dirs(h: &Harness) -> Vec<PathBuf> {
        match std::fs::read_dir(h.root.path().join("output")) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_failed_store_removes_workspace() {
        let h = harness(StubMode::Succeed);
        std::fs::remove_dir_all(h.root.path().join("cache")).unwrap();

        let err = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FileSystem(_)));
        assert!(job_dirs(&h).is_empty());
    }

    #[tokio::test]
    async fn test_failed_fallback_removes_workspace() {
        let h = harness(StubMode::FailAll);
        assert!(h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .is_err());
        assert!(job_dirs(&h).is_empty());
    }

    #[tokio::test]
    async fn test_latex_and_pdf_entries_coexist() {
        let h = harness(StubMode::Succeed);
        let pdf = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();
        let latex = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", false)
            .await
            .unwrap();
        assert_ne!(pdf.key, latex.key);

        let again = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();
        assert!(again.cached);
        assert_eq!(again.artifact, pdf.artifact);

        let stored = h.service.cached_artifact(&latex.key).await.unwrap().unwrap();
        assert_eq!(stored.kind, ArtifactKind::Latex);
        assert_eq!(h.compiler.calls(), 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_stale_job_workspaces() {
        let h = harness(StubMode::FailDocuments);
        let failed = h
            .service
            .generate(RawInput::Json(ADA_JSON), "red", true)
            .await
            .unwrap();
        let other = h.root.path().join("output").join("keep-me");
        std::fs::create_dir_all(&other).unwrap();

        let now = SystemTime::now();
        assert_eq!(h.service.sweep_workspaces(now).await.unwrap(), 0);
        assert!(h.service.fallback_path(failed.job_id).is_some());

        let later = now + WORKSPACE_TTL + Duration::from_secs(60);
        assert_eq!(h.service.sweep_workspaces(later).await.unwrap(), 1);
        assert!(h.service.fallback_path(failed.job_id).is_none());
        assert!(other.exists());
    }

    #[tokio::test]
    async fn test_all_styles_yields_one_artifact_per_standard_theme() {
        let h = harness(StubMode::Succeed);
        let record = normalize(RawInput::Json(ADA_JSON)).unwrap();
        let outcomes = h.service.generate_all_styles(&record).await;
        assert_eq!(outcomes.len(), Style::standard().count());
        assert_eq!(outcomes[0].0, "emerald");
    }
}
