//! Tier trait for representing API rate limit constraints.

/// Rate limiting constraints for an API tier.
///
/// All methods return `Option<T>` where `None` means unlimited.
///
/// # Example
///
/// ```
/// use storygen_rate_limit::Tier;
///
/// struct FreeTier;
///
/// impl Tier for FreeTier {
///     fn rpm(&self) -> Option<u32> { Some(10) }
///     fn tpm(&self) -> Option<u64> { Some(250_000) }
///     fn rpd(&self) -> Option<u32> { Some(250) }
///     fn max_concurrent(&self) -> Option<u32> { Some(1) }
///     fn name(&self) -> &str { "Free" }
/// }
///
/// assert_eq!(FreeTier.rpm(), Some(10));
/// ```
pub trait Tier: Send + Sync {
    /// Requests per minute limit.
    fn rpm(&self) -> Option<u32>;

    /// Tokens per minute limit.
    fn tpm(&self) -> Option<u64>;

    /// Requests per day limit.
    fn rpd(&self) -> Option<u32>;

    /// Maximum concurrent requests.
    fn max_concurrent(&self) -> Option<u32>;

    /// Name of the tier (e.g., "Free", "Pay-as-you-go").
    fn name(&self) -> &str;
}
