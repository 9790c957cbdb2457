mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;

use blog_portal::api::{ApiClient, ClientError};
use blog_portal::auth::{Guard, Rendered};
use blog_portal::filter::{filter_and_paginate, FilterCriteria};
use blog_portal::models::{ArticleDraft, Credentials, Role};
use blog_portal::session::{
    MemoryStore, LoginRedirect, Session, SessionError, SessionState, SessionStore, TOKEN_KEY, USER_KEY,
};

#[derive(Default)]
struct CountingRedirect(AtomicUsize);

impl LoginRedirect for CountingRedirect {
    fn redirect_to_login(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    client: Arc<ApiClient>,
    store: Arc<MemoryStore>,
    redirects: Arc<CountingRedirect>,
    session: Arc<Session>,
}

fn harness(env: &common::TestEnv) -> Result<Harness> {
    let client = Arc::new(ApiClient::new(&env.api_url())?);
    let store = Arc::new(MemoryStore::new());
    let redirects = Arc::new(CountingRedirect::default());
    let session = Arc::new(Session::new(store.clone(), client.clone(), redirects.clone()));
    Ok(Harness {
        client,
        store,
        redirects,
        session,
    })
}

fn credentials(username: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: "secret".to_string(),
    }
}

#[tokio::test]
async fn login_persists_and_restores() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;

    let user = h.session.login(&credentials("bob")).await?;
    assert_eq!(user.role, Role::User);
    assert_eq!(h.store.get(TOKEN_KEY).as_deref(), Some(common::USER_TOKEN));
    assert!(h.store.get(USER_KEY).is_some());

    // A fresh session over the same store picks the login back up
    let restored = Session::new(h.store.clone(), h.client.clone(), h.redirects.clone());
    assert_eq!(restored.initialize().await?, SessionState::Authenticated);
    assert_eq!(restored.user().map(|u| u.username), Some("bob".to_string()));
    Ok(())
}

#[tokio::test]
async fn articles_page_nine_at_a_time() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.session.login(&credentials("bob")).await?;

    let client = h.client.clone();
    let articles = h
        .session
        .authorized(move |token| async move { client.list_articles(&token).await })
        .await?;
    assert_eq!(articles.len(), common::ARTICLE_COUNT);

    let all = FilterCriteria::default();
    let first = filter_and_paginate(&articles, &all, 1, 9);
    let second = filter_and_paginate(&articles, &all, 2, 9);
    assert_eq!((first.data.len(), first.total_pages), (9, 2));
    assert_eq!((second.data.len(), second.total_pages), (3, 2));

    let rust = filter_and_paginate(&articles, &FilterCriteria::new("  RUST "), 1, 9);
    assert_eq!(rust.total, 4);

    let programming = filter_and_paginate(&articles, &FilterCriteria::new("").with_category("2"), 1, 9);
    assert_eq!(programming.total, 4);
    assert!(programming.data.iter().all(|a| a.category_id == "2"));
    Ok(())
}

#[tokio::test]
async fn envelope_pages_are_followed() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.session.login(&credentials("bob")).await?;

    let client = h.client.clone();
    let categories = h
        .session
        .authorized(move |token| async move { client.list_categories(&token).await })
        .await?;

    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Travel", "Programming", "Empty shelf"]);
    Ok(())
}

#[tokio::test]
async fn guard_denies_admin_actions_to_users() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.session.login(&credentials("bob")).await?;

    let rendered = Guard::admin().render(&h.session.snapshot(), |_| "admin panel");
    assert!(matches!(rendered, Rendered::Denied(_)));

    let allowed = Guard::authenticated().render(&h.session.snapshot(), |user| user.username.clone());
    assert_eq!(allowed.content(), Some("bob".to_string()));
    Ok(())
}

#[tokio::test]
async fn forbidden_keeps_the_session() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.session.login(&credentials("bob")).await?;

    let client = h.client.clone();
    let draft = ArticleDraft {
        title: "Sneaky".to_string(),
        content: "Body".to_string(),
        excerpt: None,
        category_id: "1".to_string(),
    };
    let err = h
        .session
        .authorized(move |token| async move { client.create_article(&token, &draft).await })
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Client(ClientError::Forbidden(_))));
    assert_eq!(h.session.state(), SessionState::Authenticated);
    assert_eq!(h.redirects.0.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn admin_sees_friendly_delete_conflict() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.session.login(&credentials("ana")).await?;

    let client = h.client.clone();
    let err = h
        .session
        .authorized(move |token| async move { client.delete_category(&token, "2").await })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Category is in use by existing articles");
    assert_eq!(h.session.state(), SessionState::Authenticated);
    Ok(())
}

#[tokio::test]
async fn concurrent_unauthorized_calls_redirect_once() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.session.login(&credentials("eve")).await?;

    let (a, b) = (h.client.clone(), h.client.clone());
    let (first, second) = futures::join!(
        h.session
            .authorized(move |token| async move { a.list_articles(&token).await }),
        h.session
            .authorized(move |token| async move { b.list_categories(&token).await }),
    );

    assert!(first.unwrap_err().is_unauthorized());
    assert!(second.unwrap_err().is_unauthorized());
    assert_eq!(h.redirects.0.load(Ordering::SeqCst), 1);
    assert_eq!(h.session.state(), SessionState::Unauthenticated);
    assert!(h.store.get(TOKEN_KEY).is_none());
    assert!(h.store.get(USER_KEY).is_none());

    // The next login re-arms the redirect
    h.session.login(&credentials("eve")).await?;
    let client = h.client.clone();
    let _ = h
        .session
        .authorized(move |token| async move { client.list_articles(&token).await })
        .await;
    assert_eq!(h.redirects.0.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn rejected_persisted_token_is_cleared() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.store.set(TOKEN_KEY, common::REVOKED_TOKEN)?;
    h.store.set(USER_KEY, r#"{"id":3,"username":"eve","role":"User"}"#)?;

    assert_eq!(h.session.initialize().await?, SessionState::Unauthenticated);
    assert!(h.store.get(TOKEN_KEY).is_none());
    assert!(h.store.get(USER_KEY).is_none());
    assert!(h.session.user().is_none());
    Ok(())
}

#[tokio::test]
async fn logout_needs_no_backend() -> Result<()> {
    let env = common::TestEnv::start().await?;
    let h = harness(&env)?;
    h.session.login(&credentials("ana")).await?;

    h.session.logout();
    assert_eq!(h.session.state(), SessionState::Unauthenticated);
    assert!(h.store.get(TOKEN_KEY).is_none());
    assert_eq!(h.redirects.0.load(Ordering::SeqCst), 0);
    Ok(())
}
