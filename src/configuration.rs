pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    fn database_url(&self) -> Option<String>;
    /// Secret used to sign and verify access tokens.
    fn access_token(&self) -> String;
    fn token_validity_days(&self) -> i64;
    fn seed_examples(&self) -> bool;
}
