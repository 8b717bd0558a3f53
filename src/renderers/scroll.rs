use crate::error::ExtractionError;
use async_trait::async_trait;
use std::time::Duration;

/// Parameters of the scroll-convergence loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPolicy {
    /// Pause after each scroll so lazy content can load
    pub interval: Duration,
    /// Hard cap on the number of scrolls
    pub max_attempts: u32,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 30,
        }
    }
}

/// Something that can be scrolled and measured, usually a browser page
#[async_trait]
pub trait ScrollSurface: Send {
    /// Current total height of the document
    async fn document_height(&mut self) -> Result<u64, ExtractionError>;

    /// Scroll to the current bottom of the document
    async fn scroll_to_bottom(&mut self) -> Result<(), ExtractionError>;
}

/// What the convergence loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Number of scrolls issued
    pub scrolls: u32,
    /// Number of height measurements taken, including the initial one
    pub measurements: u32,
    /// Height at the last measurement
    pub final_height: u64,
    /// False when the loop stopped at the attempt cap
    pub converged: bool,
}

/// Scroll until the document stops growing or the attempt cap is hit.
///
/// Measures once up front, then repeats scroll, wait, measure. Stops on the
/// first measurement that is not taller than the previous one, so a page
/// that stabilises on scroll `k` takes `k + 1` measurements. Only height is
/// tracked; horizontally growing pages are not detected.
pub async fn converge<S>(surface: &mut S, policy: &ScrollPolicy) -> Result<ScrollOutcome, ExtractionError>
where
    S: ScrollSurface + ?Sized,
{
    let mut last_height = surface.document_height().await?;
    let mut outcome = ScrollOutcome {
        scrolls: 0,
        measurements: 1,
        final_height: last_height,
        converged: false,
    };
    ::log::trace!("Initial document height: {}", last_height);

    while outcome.scrolls < policy.max_attempts {
        surface.scroll_to_bottom().await?;
        outcome.scrolls += 1;

        tokio::time::sleep(policy.interval).await;

        let height = surface.document_height().await?;
        outcome.measurements += 1;
        outcome.final_height = height;
        ::log::trace!(
            "Scroll {}: height {} -> {}",
            outcome.scrolls,
            last_height,
            height
        );

        if height <= last_height {
            outcome.converged = true;
            break;
        }
        last_height = height;
    }

    if outcome.converged {
        ::log::debug!(
            "Scrolling converged after {} scrolls at height {}",
            outcome.scrolls,
            outcome.final_height
        );
    } else {
        ::log::warn!(
            "Scrolling stopped at the cap of {} attempts (height still growing: {})",
            policy.max_attempts,
            outcome.final_height
        );
    }

    Ok(outcome)
}
