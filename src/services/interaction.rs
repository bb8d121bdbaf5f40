use std::time::Duration;

use super::browser::{BrowserSession, PageElement, UiError};

/// Bounded retry for clicks that fail because the target is momentarily
/// obscured by an overlay. Any other failure class propagates immediately.
#[derive(Debug, Clone)]
pub struct InteractionRetrier {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for InteractionRetrier {
    fn default() -> Self {
        // 3 attempts with a 1s pause matches the observed UI settle time.
        InteractionRetrier {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl InteractionRetrier {
    /// Returns `Ok(true)` on a successful click and `Ok(false)` once the
    /// attempt budget is exhausted. A failed click is never fatal to the
    /// surrounding loop; callers log and continue.
    pub async fn click<E: PageElement>(&self, element: &E) -> Result<bool, UiError> {
        for attempt in 1..=self.max_attempts {
            match element.click().await {
                Ok(()) => return Ok(true),
                Err(UiError::InteractionBlocked { reason }) => {
                    log::warn!(
                        "Click attempt {} failed, element is obscured: {}. Retrying...",
                        attempt,
                        reason
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(other) => return Err(other),
            }
        }
        log::error!(
            "Failed to click element after {} attempts.",
            self.max_attempts
        );
        Ok(false)
    }
}

/// Scrolls a container to its bottom until the content height stops growing,
/// so lazily loaded entries become queryable before enumeration.
#[derive(Debug, Clone)]
pub struct LazyListExpander {
    pub pause: Duration,
    pub max_scrolls: u32,
}

impl Default for LazyListExpander {
    fn default() -> Self {
        LazyListExpander {
            pause: Duration::from_millis(500),
            max_scrolls: 30,
        }
    }
}

impl LazyListExpander {
    /// Terminates when the height is unchanged between two consecutive
    /// measurements, or at `max_scrolls` as a bound against endless feeds.
    pub async fn expand_to_bottom<S: BrowserSession>(
        &self,
        session: &S,
        container: &S::Elem,
    ) -> Result<(), UiError> {
        let mut last_height = session.content_height(container).await?;
        for _ in 0..self.max_scrolls {
            session.scroll_to_bottom(container).await?;
            tokio::time::sleep(self.pause).await;
            let new_height = session.content_height(container).await?;
            if new_height == last_height {
                break;
            }
            last_height = new_height;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{InteractionRetrier, LazyListExpander};
    use crate::services::fake::{ClickScript, FakeElement, FakeSession};
    use crate::services::UiError;

    fn retrier() -> InteractionRetrier {
        InteractionRetrier {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn blocked_click_uses_exactly_the_attempt_budget() {
        let element = FakeElement::builder()
            .click(ClickScript::AlwaysBlocked)
            .build();

        let outcome = retrier().click(&element).await.unwrap();

        assert!(!outcome);
        assert_eq!(element.click_count(), 3);
    }

    #[tokio::test]
    async fn click_succeeds_after_transient_block() {
        let element = FakeElement::builder()
            .click(ClickScript::BlockedTimes(1))
            .build();

        let outcome = retrier().click(&element).await.unwrap();

        assert!(outcome);
        assert_eq!(element.click_count(), 2);
    }

    #[tokio::test]
    async fn non_retryable_failure_propagates_immediately() {
        let element = FakeElement::builder().click(ClickScript::Fail).build();

        let result = retrier().click(&element).await;

        assert!(matches!(result, Err(UiError::Session(_))));
        assert_eq!(element.click_count(), 1);
    }

    #[tokio::test]
    async fn scrolling_stops_on_stable_height() {
        // Height settles after two scrolls; the third scroll confirms it.
        let session = FakeSession::new().with_heights(vec![100, 150, 200, 200]);
        let container = FakeElement::builder().build();
        let expander = LazyListExpander {
            pause: Duration::ZERO,
            max_scrolls: 30,
        };

        expander
            .expand_to_bottom(&session, &container)
            .await
            .unwrap();

        assert_eq!(session.scroll_count(), 3);
    }

    #[tokio::test]
    async fn scrolling_stops_at_the_safety_bound() {
        let heights: Vec<i64> = (0..40).map(|i| i * 10).collect();
        let session = FakeSession::new().with_heights(heights);
        let container = FakeElement::builder().build();
        let expander = LazyListExpander {
            pause: Duration::ZERO,
            max_scrolls: 5,
        };

        expander
            .expand_to_bottom(&session, &container)
            .await
            .unwrap();

        assert_eq!(session.scroll_count(), 5);
    }
}
