mod perform_swap;

pub use perform_swap::PerformSwapHandler;
