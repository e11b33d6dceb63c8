#![allow(dead_code)]

use axum::{
    body::Bytes,
    http::{header, StatusCode},
};
use axum_test::{
    multipart::{MultipartForm, Part},
    TestResponse, TestServer,
};
use serde_json::Value;
use tempfile::TempDir;

use postboard::{
    app_state::AppState,
    blog_interface::create_blog_router,
    config::Config,
    entities::{EntGroup, EntPost, EntUser, NewGroup, NewPost},
};

pub const IDENTITY_HEADER: &str = "x-remote-user";

/// A small PNG produced by the same codec the form validates with.
pub fn tiny_png() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgb8(2, 1)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Router over an in-memory store with media in a scratch directory.
pub struct TestApp {
    pub state: AppState,
    pub server: TestServer,
    pub media: TempDir,
}

/// Reads the `{"template", "context"}` documents the presenter renders.
pub trait RenderedPage {
    fn template(&self) -> String;
    fn context(&self) -> Value;
    fn location(&self) -> Option<String>;
    /// Number of posts on the rendered page.
    fn page_len(&self) -> usize;
}

impl RenderedPage for TestResponse {
    fn template(&self) -> String {
        self.json::<Value>()["template"].as_str().unwrap_or_default().to_string()
    }

    fn context(&self) -> Value {
        self.json::<Value>()["context"].clone()
    }

    fn location(&self) -> Option<String> {
        self.headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    fn page_len(&self) -> usize {
        self.context()["page_obj"]["object_list"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0)
    }
}

pub fn assert_redirect(response: &TestResponse, target: &str) {
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.location().as_deref(), Some(target));
}

impl TestApp {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let config = Config::for_tests(media.path());
        let state = AppState::new(config).await.unwrap();
        let server = TestServer::new(create_blog_router(state.clone())).unwrap();
        Self { state, server, media }
    }

    pub async fn user(&self, username: &str) -> EntUser {
        self.state.db.create_user(username).await.unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> EntGroup {
        self.state
            .db
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: Some(format!("About {}", title)),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &EntUser, text: &str, group: Option<&EntGroup>) -> EntPost {
        self.state
            .db
            .create_post(NewPost {
                text: text.to_string(),
                author_id: author.id,
                group_id: group.map(|group| group.id),
                image: None,
            })
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> TestResponse {
        let request = self.server.get(uri);
        match user {
            Some(username) => request.add_header(IDENTITY_HEADER, username).await,
            None => request.await,
        }
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], user: Option<&str>) -> TestResponse {
        let request = self.server.post(uri).form(&fields);
        match user {
            Some(username) => request.add_header(IDENTITY_HEADER, username).await,
            None => request.await,
        }
    }

    /// Multipart post: text fields plus an optional `image` file part.
    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, Vec<u8>)>,
        user: Option<&str>,
    ) -> TestResponse {
        let mut form = MultipartForm::new();
        for (name, value) in fields {
            form = form.add_text(name.to_string(), value.to_string());
        }
        if let Some((file_name, data)) = image {
            form = form.add_part(
                "image",
                Part::bytes(data).file_name(file_name.to_string()).mime_type("image/png"),
            );
        }

        let request = self.server.post(uri).multipart(form);
        match user {
            Some(username) => request.add_header(IDENTITY_HEADER, username).await,
            None => request.await,
        }
    }

    /// Raw body with an arbitrary content type, for unreadable submissions.
    pub async fn post_raw(&self, uri: &str, content_type: &str, body: &'static str, user: Option<&str>) -> TestResponse {
        let request = self
            .server
            .post(uri)
            .bytes(Bytes::from_static(body.as_bytes()))
            .content_type(content_type);
        match user {
            Some(username) => request.add_header(IDENTITY_HEADER, username).await,
            None => request.await,
        }
    }
}
