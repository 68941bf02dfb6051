use anyhow::Context as _;

/// One client per run. The origin rejects default client identifiers, so the
/// configured User-Agent rides on every request.
pub fn build_client(user_agent: &str) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build http client")
}
