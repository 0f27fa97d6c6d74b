//! Deployment smoke endpoint.

/// Fixed greeting confirming the deployment is reachable. No inputs, no
/// state; used by the rollout checks.
pub async fn test_greeting() -> &'static str {
    "Hello from IntegrationLayer-TEST! This is a test function."
}
