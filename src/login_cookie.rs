//! "Login for cookie": POST the password form to the login URL, then fetch the landing page
//! with the same cookie jar. Session cookies accumulate in the jar across both round trips.

use crate::client::Session;
use anyhow::Context;
use reqwest::StatusCode;
use tracing::debug;

/// Login statuses accepted as success. A successful login normally redirects (302); 200 is also let through.
pub const LOGIN_OK_STATUSES: [StatusCode; 2] = [StatusCode::OK, StatusCode::FOUND];

/// POST `password=<password>` to `login_url` without following redirects. Fails on any status outside
/// [`LOGIN_OK_STATUSES`].
pub async fn login(session: &Session, login_url: &str, password: &str) -> anyhow::Result<StatusCode> {
    let response = session
        .login_client()
        .post(login_url)
        .form(&[("password", password)])
        .send()
        .await
        .context("login request")?;
    let status = response.status();
    if !LOGIN_OK_STATUSES.contains(&status) {
        anyhow::bail!("login failed: {}", status.as_u16());
    }
    debug!(status = status.as_u16(), "login accepted");
    Ok(status)
}

/// GET the landing page with the logged-in session; returns the body. Only 200 is accepted.
pub async fn fetch_index(session: &Session, index_url: &str) -> anyhow::Result<String> {
    let response = session
        .client()
        .get(index_url)
        .send()
        .await
        .context("index request")?;
    let status = response.status();
    if status != StatusCode::OK {
        anyhow::bail!("index fetch failed: {}", status.as_u16());
    }
    let body = response.text().await.context("read index body")?;
    debug!(bytes = body.len(), "index page fetched");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn login_with_status(status: u16) -> anyhow::Result<StatusCode> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        let session = Session::new().unwrap();
        login(&session, &format!("{}/login", server.uri()), "secret").await
    }

    #[tokio::test]
    async fn login_accepts_200_and_302() {
        assert_eq!(login_with_status(200).await.unwrap(), StatusCode::OK);
        assert_eq!(login_with_status(302).await.unwrap(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn login_rejects_other_statuses_with_code_in_message() {
        for status in [401u16, 403, 500, 303] {
            let err = login_with_status(status).await.unwrap_err();
            assert_eq!(err.to_string(), format!("login failed: {}", status));
        }
    }

    #[tokio::test]
    async fn login_posts_password_as_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("password=p%40ss+word"))
            .respond_with(ResponseTemplate::new(302))
            .expect(1)
            .mount(&server)
            .await;
        let session = Session::new().unwrap();
        login(&session, &format!("{}/login", server.uri()), "p@ss word")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fetch_index_returns_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;
        let session = Session::new().unwrap();
        let body = fetch_index(&session, &format!("{}/", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>hi</html>");
    }

    #[tokio::test]
    async fn fetch_index_rejects_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let session = Session::new().unwrap();
        let err = fetch_index(&session, &format!("{}/", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "index fetch failed: 500");
    }
}
