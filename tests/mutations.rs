mod common;

use axum::http::StatusCode;
use common::{assert_redirect, tiny_png, RenderedPage, TestApp};
use postboard::{
    forms::{PostFormData, UploadedFile},
    handlers::{posts, PostSubmission},
    infrastructure::{PostFilter, ViewerContext},
};

#[tokio::test]
async fn test_anonymous_callers_are_redirected() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let post = app.post(&author, "Text", None).await;

    assert_redirect(&app.get("/create/", None).await, "/");

    let edit_uri = format!("/posts/{}/edit/", post.id);
    assert_redirect(&app.get(&edit_uri, None).await, &format!("/?next={}", edit_uri));

    assert_redirect(&app.get("/follow/", None).await, "/?next=/follow/");
    assert_redirect(
        &app.get("/profile/auth/follow/", None).await,
        "/?next=/profile/auth/follow/",
    );
}

#[tokio::test]
async fn test_unreadable_bodies_still_reach_the_privacy_gate() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    app.user("other").await;
    let post = app.post(&author, "Original", None).await;
    let edit_uri = format!("/posts/{}/edit/", post.id);

    for content_type in ["multipart/form-data", "multipart/form-data; boundary=xyz"] {
        let create = app.post_raw("/create/", content_type, "junk", None).await;
        assert_redirect(&create, "/");

        let anonymous_edit = app.post_raw(&edit_uri, content_type, "junk", None).await;
        assert_redirect(&anonymous_edit, &format!("/?next={}", edit_uri));

        let foreign_edit = app.post_raw(&edit_uri, content_type, "junk", Some("other")).await;
        assert_redirect(&foreign_edit, &format!("/posts/{}/", post.id));
    }

    let stored = app.state.db.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Original");
}

#[tokio::test]
async fn test_unreadable_body_from_author_shows_the_form() {
    let app = TestApp::new().await;
    app.user("auth").await;

    let page = app
        .post_raw("/create/", "multipart/form-data; boundary=xyz", "junk", Some("auth"))
        .await;
    page.assert_status(StatusCode::OK);
    assert_eq!(page.template(), "posts/create_post.html");
    assert_eq!(app.state.db.count_posts(&PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_user_header_is_anonymous() {
    let app = TestApp::new().await;
    assert_redirect(&app.get("/create/", Some("ghost")).await, "/");
}

#[tokio::test]
async fn test_create_form_and_submission() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let group = app.group("Test group", "test-slug").await;

    let form = app.get("/create/", Some("auth")).await;
    form.assert_status(StatusCode::OK);
    assert_eq!(form.template(), "posts/create_post.html");
    assert_eq!(form.context()["title"], "New post");
    assert_eq!(form.context()["form"]["group_choices"][0]["title"], "Test group");

    let group_id = group.id.to_string();
    let created = app
        .post_form("/create/", &[("text", "Brand new"), ("group", &group_id)], Some("auth"))
        .await;
    assert_redirect(&created, "/profile/auth/");

    let posts = app.state.db.list_posts(&PostFilter::Author(author.id), 0, 10).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "Brand new");
    assert_eq!(posts[0].group_id, Some(group.id));
}

#[tokio::test]
async fn test_invalid_submission_rerenders_with_errors() {
    let app = TestApp::new().await;
    app.user("auth").await;

    let page = app
        .post_form("/create/", &[("text", ""), ("group", "999")], Some("auth"))
        .await;
    page.assert_status(StatusCode::OK);
    let errors = &page.context()["form"]["errors"];
    assert!(errors["text"].is_array());
    assert!(errors["group"].is_array());
    assert_eq!(app.state.db.count_posts(&PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_with_image_upload() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let png = tiny_png();

    let created = app
        .post_multipart(
            "/create/",
            &[("text", "With picture"), ("group", "")],
            Some(("small.png", png.clone())),
            Some("auth"),
        )
        .await;
    created.assert_status(StatusCode::FOUND);

    let posts = app.state.db.list_posts(&PostFilter::Author(author.id), 0, 10).await.unwrap();
    assert_eq!(posts[0].image.as_deref(), Some("posts/small.png"));
    assert!(app.media.path().join("posts").join("small.png").exists());

    let served = app.get("/media/posts/small.png", None).await;
    served.assert_status(StatusCode::OK);
    assert_eq!(&served.as_bytes()[..], &png[..]);
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let app = TestApp::new().await;
    app.user("auth").await;

    let page = app
        .post_multipart(
            "/create/",
            &[("text", "Bad file")],
            Some(("notes.gif", b"GIF89a this is not an image".to_vec())),
            Some("auth"),
        )
        .await;
    page.assert_status(StatusCode::OK);
    assert!(page.context()["form"]["errors"]["image"].is_array());
    assert_eq!(app.state.db.count_posts(&PostFilter::All).await.unwrap(), 0);
    assert!(!app.media.path().join("posts").join("notes.gif").exists());
}

#[tokio::test]
async fn test_failed_insert_leaves_no_orphaned_upload() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let viewer = ViewerContext::authenticated_user(author.clone(), "req-orphan".to_string());
    // The account vanishes between sign-in and submit, so the insert breaks its foreign key.
    assert!(app.state.db.delete_user(author.id).await.unwrap());

    let submission = PostSubmission {
        data: PostFormData {
            text: Some("Lost post".to_string()),
            group: Some(String::new()),
        },
        image: Some(UploadedFile {
            file_name: "small.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: tiny_png(),
        }),
    };
    let result = posts::post_create(&app.state, &viewer, "/create/", Some(submission)).await;

    assert!(result.is_err());
    assert!(!app.media.path().join("posts").join("small.png").exists());
}

#[tokio::test]
async fn test_author_edits_post() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let group = app.group("Test group", "test-slug").await;
    let post = app.post(&author, "Before", None).await;
    let uri = format!("/posts/{}/edit/", post.id);

    let form = app.get(&uri, Some("auth")).await;
    form.assert_status(StatusCode::OK);
    assert_eq!(form.context()["is_edit"], true);
    assert_eq!(form.context()["title"], "Edit post");
    assert_eq!(form.context()["form"]["initial"]["text"], "Before");

    let group_id = group.id.to_string();
    let saved = app
        .post_form(&uri, &[("text", "After"), ("group", &group_id)], Some("auth"))
        .await;
    assert_redirect(&saved, &format!("/posts/{}/", post.id));

    let stored = app.state.db.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "After");
    assert_eq!(stored.group_id, Some(group.id));
    assert_eq!(stored.author_id, author.id);
}

#[tokio::test]
async fn test_invalid_edit_rerenders_edit_form() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let group = app.group("Test group", "test-slug").await;
    let post = app.post(&author, "Before", Some(&group)).await;
    let uri = format!("/posts/{}/edit/", post.id);

    let page = app
        .post_form(&uri, &[("text", "Changed"), ("group", "999")], Some("auth"))
        .await;
    page.assert_status(StatusCode::OK);
    assert_eq!(page.template(), "posts/create_post.html");
    let context = page.context();
    assert_eq!(context["is_edit"], true);
    assert_eq!(context["title"], "Edit post");
    assert_eq!(context["form"]["data"]["text"], "Changed");
    assert_eq!(context["form"]["data"]["group"], "999");
    assert!(context["form"]["errors"]["group"].is_array());

    let stored = app.state.db.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Before");
    assert_eq!(stored.group_id, Some(group.id));
}

#[tokio::test]
async fn test_edit_keeps_existing_image() {
    let app = TestApp::new().await;
    app.user("auth").await;
    app.post_multipart("/create/", &[("text", "Pictured")], Some(("small.png", tiny_png())), Some("auth"))
        .await;
    let post = app.state.db.list_posts(&PostFilter::All, 0, 1).await.unwrap().remove(0);

    app.post_form(&format!("/posts/{}/edit/", post.id), &[("text", "Retitled")], Some("auth"))
        .await;

    let stored = app.state.db.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Retitled");
    assert_eq!(stored.image.as_deref(), Some("posts/small.png"));
}

#[tokio::test]
async fn test_non_author_cannot_edit() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    app.user("other").await;
    let group = app.group("Test group", "test-slug").await;
    let post = app.post(&author, "Original", Some(&group)).await;
    let uri = format!("/posts/{}/edit/", post.id);
    let detail = format!("/posts/{}/", post.id);

    assert_redirect(&app.get(&uri, Some("other")).await, &detail);

    let attempt = app
        .post_form(&uri, &[("text", "Hijacked"), ("group", "")], Some("other"))
        .await;
    assert_redirect(&attempt, &detail);

    let stored = app.state.db.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Original");
    assert_eq!(stored.group_id, Some(group.id));
    assert_eq!(stored.author_id, author.id);
}

#[tokio::test]
async fn test_edit_of_missing_post_is_not_found() {
    let app = TestApp::new().await;
    app.user("auth").await;
    app.get("/posts/42/edit/", Some("auth"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments_require_login() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let post = app.post(&author, "Discuss", None).await;
    let uri = format!("/posts/{}/comment/", post.id);

    let anonymous = app.post_form(&uri, &[("text", "Hi")], None).await;
    assert_redirect(&anonymous, &format!("/?next={}", uri));
    assert_eq!(app.state.db.count_comments(post.id).await.unwrap(), 0);

    let signed_in = app.post_form(&uri, &[("text", "Hi")], Some("auth")).await;
    assert_redirect(&signed_in, &format!("/posts/{}/", post.id));
    assert_eq!(app.state.db.count_comments(post.id).await.unwrap(), 1);

    let detail = app.get(&format!("/posts/{}/", post.id), None).await;
    assert_eq!(detail.context()["comments"][0]["text"], "Hi");
    assert_eq!(detail.context()["comments_count"], 1);
}

#[tokio::test]
async fn test_comment_on_missing_post_is_not_found() {
    let app = TestApp::new().await;
    app.user("auth").await;

    let page = app.post_form("/posts/42/comment/", &[("text", "Hi")], Some("auth")).await;
    page.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(page.template(), "core/404.html");
}

#[tokio::test]
async fn test_blank_comment_is_dropped() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let post = app.post(&author, "Discuss", None).await;

    let response = app
        .post_form(&format!("/posts/{}/comment/", post.id), &[("text", "   ")], Some("auth"))
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(app.state.db.count_comments(post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_follow_is_idempotent_and_unfollow_tolerates_missing_edge() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let reader = app.user("reader").await;

    for _ in 0..2 {
        assert_redirect(&app.get("/profile/auth/follow/", Some("reader")).await, "/profile/auth/");
    }
    assert_eq!(app.state.db.count_follows(reader.id, author.id).await.unwrap(), 1);

    for _ in 0..2 {
        assert_redirect(&app.get("/profile/auth/unfollow/", Some("reader")).await, "/profile/auth/");
    }
    assert_eq!(app.state.db.count_follows(reader.id, author.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_self_follow_is_skipped() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;

    assert_redirect(&app.get("/profile/auth/follow/", Some("auth")).await, "/profile/auth/");
    assert_eq!(app.state.db.count_follows(author.id, author.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_follow_feed_lists_followed_authors_only() {
    let app = TestApp::new().await;
    let author = app.user("auth").await;
    let stranger = app.user("stranger").await;
    app.user("reader").await;
    app.user("loner").await;
    app.post(&author, "Followed", None).await;
    app.post(&stranger, "Not followed", None).await;

    app.get("/profile/auth/follow/", Some("reader")).await;

    let feed = app.get("/follow/", Some("reader")).await;
    assert_eq!(feed.template(), "posts/follow.html");
    assert_eq!(feed.page_len(), 1);
    assert_eq!(feed.context()["page_obj"]["object_list"][0]["text"], "Followed");

    let empty = app.get("/follow/", Some("loner")).await;
    empty.assert_status(StatusCode::OK);
    assert_eq!(empty.page_len(), 0);
}
