//! One-page error document produced when the real document fails to compile.

use std::{path::Path, time::Duration};

use tracing::{error, info};

use crate::{compile::DocumentCompiler, errors::AppError};

const VERBATIM_END: &str = "\\end{verbatim}";

/// LaTeX source of the error page. The message goes into a verbatim block, so
/// only the sequence that would close that block needs neutralizing.
pub fn fallback_source(message: &str) -> String {
    let message = message.replace(VERBATIM_END, "\\end {verbatim}");
    format!(
        r"\documentclass{{article}}
\usepackage{{xcolor}}
\usepackage{{geometry}}
\geometry{{margin=1in}}
\begin{{document}}
\begin{{center}}
\LARGE\textbf{{CV Generation Failed}}
\end{{center}}

\vspace{{1cm}}
\begin{{center}}
\large\textcolor{{red}}{{An error occurred while generating your CV.}}
\end{{center}}

\vspace{{0.5cm}}
\begin{{verbatim}}
{message}
\end{{verbatim}}

\vspace{{1cm}}
\begin{{center}}
Please check your input data and try again.
\end{{center}}
\end{{document}}
"
    )
}

/// Compiles the error page in a scratch directory and copies the PDF to `output`.
pub async fn create_fallback_pdf(
    compiler: &dyn DocumentCompiler,
    output: &Path,
    message: &str,
    limit: Duration,
) -> Result<(), AppError> {
    let scratch = tempfile::TempDir::new()?;
    let source = scratch.path().join("error.tex");
    tokio::fs::write(&source, fallback_source(message)).await?;

    let pdf = compiler
        .compile_with_timeout(&source, limit)
        .await
        .map_err(|e| {
            error!("Failed to create fallback PDF: {e}");
            e
        })?;

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(&pdf, output).await?;
    info!("Fallback PDF written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::stub::{StubCompiler, StubMode};
    use tempfile::TempDir;

    #[test]
    fn test_message_cannot_close_verbatim() {
        let source = fallback_source("bad \\end{verbatim} \\input{/etc/passwd}");
        assert_eq!(source.matches(VERBATIM_END).count(), 1);
        assert!(source.contains("\\input{/etc/passwd}"));
    }

    #[tokio::test]
    async fn test_fallback_pdf_written_to_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("job").join("fallback.pdf");
        let compiler = StubCompiler::new(StubMode::FailDocuments);

        create_fallback_pdf(&compiler, &output, "boom", Duration::from_secs(5))
            .await
            .unwrap();

        let bytes = tokio::fs::read(&output).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(String::from_utf8_lossy(&bytes).contains("boom"));
    }

    #[tokio::test]
    async fn test_fallback_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("fallback.pdf");
        let compiler = StubCompiler::new(StubMode::FailAll);

        let result = create_fallback_pdf(&compiler, &output, "boom", Duration::from_secs(5)).await;
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
