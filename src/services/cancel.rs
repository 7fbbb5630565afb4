use log::debug;
use tokio_util::sync::CancellationToken;

/// Cancellation scope of one aggregation run, threaded through every fetch.
#[derive(Clone, Debug)]
pub struct CancellationContext {
    generation: u64,
    token: CancellationToken,
}

impl CancellationContext {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Hands out generations. Starting one cancels the one before it.
#[derive(Debug, Default)]
pub struct GenerationController {
    generation: u64,
    active: Option<CancellationToken>,
}

impl GenerationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> CancellationContext {
        self.cancel();
        self.generation += 1;

        let token = CancellationToken::new();
        self.active = Some(token.clone());
        debug!("Generation {} started", self.generation);

        CancellationContext {
            generation: self.generation,
            token,
        }
    }

    /// Cancels the active generation, returning its number if there was one.
    pub fn cancel(&mut self) -> Option<u64> {
        let token = self.active.take()?;
        token.cancel();
        debug!("Generation {} cancelled", self.generation);
        Some(self.generation)
    }

    pub fn current(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_cancels_previous() {
        let mut controller = GenerationController::new();
        let first = controller.begin();
        assert_eq!(first.generation(), 1);
        assert!(!first.is_cancelled());

        let second = controller.begin();
        assert_eq!(second.generation(), 2);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(controller.current(), 2);
    }

    #[test]
    fn test_cancel_is_one_shot() {
        let mut controller = GenerationController::new();
        assert_eq!(controller.cancel(), None);

        let ctx = controller.begin();
        assert_eq!(controller.cancel(), Some(1));
        assert!(ctx.is_cancelled());
        assert_eq!(controller.cancel(), None);
    }

    #[tokio::test]
    async fn test_cloned_context_observes_cancellation() {
        let mut controller = GenerationController::new();
        let ctx = controller.begin();
        let in_flight = ctx.clone();

        let waiter = tokio::spawn(async move { in_flight.token().cancelled().await });
        controller.cancel();
        waiter.await.unwrap();
        assert!(ctx.is_cancelled());
    }
}
