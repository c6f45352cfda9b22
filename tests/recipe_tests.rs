mod common;

use axum::http::StatusCode;
use common::{ids, names, png_bytes, spawn_app};
use serde_json::json;

fn sample(title: &str) -> serde_json::Value {
    json!({"title": title, "time_minutes": 10, "price": "5.50"})
}

#[tokio::test]
async fn test_list_is_limited_to_caller_and_newest_first() {
    let app = spawn_app().await;
    let alice = app.user("alice@example.com").await;
    let bob = app.user("bob@example.com").await;

    let first = app.create_recipe(&alice, sample("Soup")).await;
    let second = app.create_recipe(&alice, sample("Stew")).await;
    app.create_recipe(&bob, sample("Bread")).await;

    let (status, body) = app.get("/api/recipes", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["data"]), vec![second, first]);
}

#[tokio::test]
async fn test_create_returns_summary() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let (status, body) = app
        .post(
            "/api/recipes",
            &token,
            json!({
                "title": "Curry",
                "time_minutes": 30,
                "price": 5.5,
                "link": "https://example.com/curry",
                "tags": [{"name": "Dinner"}],
                "ingredients": [{"name": "Rice"}, {"name": "Cumin"}]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["title"], "Curry");
    assert_eq!(data["time_minutes"], 30);
    assert_eq!(data["price"], "5.50");
    assert_eq!(data["link"], "https://example.com/curry");
    assert_eq!(names(&data["tags"]), vec!["Dinner"]);
    assert_eq!(names(&data["ingredients"]), vec!["Rice", "Cumin"]);
    assert!(data.get("description").is_none());
}

#[tokio::test]
async fn test_create_requires_core_fields() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let (status, body) = app.post("/api/recipes", &token, json!({"title": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["title"].is_array());
    assert!(body["fields"]["time_minutes"].is_array());
    assert!(body["fields"]["price"].is_array());

    let (status, body) = app
        .post(
            "/api/recipes",
            &token,
            json!({"title": "Soup", "time_minutes": -1, "price": "abc"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["time_minutes"].is_array());
    assert!(body["fields"]["price"].is_array());
}

#[tokio::test]
async fn test_create_reuses_existing_tags() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let (_, salad) = app
        .post(
            "/api/recipes",
            &token,
            json!({
                "title": "Salad", "time_minutes": 5, "price": "2.00",
                "tags": [{"name": "Vegan"}]
            }),
        )
        .await;
    let vegan_id = salad["data"]["tags"][0]["id"].as_i64().unwrap();

    let (status, body) = app
        .post(
            "/api/recipes",
            &token,
            json!({
                "title": "Smoothie", "time_minutes": 3, "price": "3.00",
                "tags": [{"name": "Vegan"}, {"name": "Breakfast"}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 2);
    assert!(ids(&body["data"]["tags"]).contains(&vegan_id));

    let (_, tags) = app.get("/api/tags", &token).await;
    assert_eq!(names(&tags["data"]), vec!["Vegan", "Breakfast"]);
}

#[tokio::test]
async fn test_vegan_dessert_scenario() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app
        .create_recipe(
            &token,
            json!({
                "title": "Pie", "time_minutes": 60, "price": "7.25",
                "tags": [{"name": "Vegan"}, {"name": "Dessert"}]
            }),
        )
        .await;

    let (status, body) = app
        .patch(
            &format!("/api/recipes/{id}"),
            &token,
            json!({"tags": [{"name": "Lunch"}]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]["tags"]), vec!["Lunch"]);

    // Unlinked tags stay in the caller's collection
    let (_, tags) = app.get("/api/tags", &token).await;
    assert_eq!(names(&tags["data"]), vec!["Vegan", "Lunch", "Dessert"]);

    let (_, assigned) = app.get("/api/tags?assigned_only=1", &token).await;
    assert_eq!(names(&assigned["data"]), vec!["Lunch"]);
}

#[tokio::test]
async fn test_patch_nested_lists() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app
        .create_recipe(
            &token,
            json!({
                "title": "Tacos", "time_minutes": 20, "price": "4.00",
                "tags": [{"name": "Mexican"}],
                "ingredients": [{"name": "Tortilla"}]
            }),
        )
        .await;
    let uri = format!("/api/recipes/{id}");

    // Absent lists are left alone
    let (status, body) = app.patch(&uri, &token, json!({"title": "Fish Tacos"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Fish Tacos");
    assert_eq!(names(&body["data"]["tags"]), vec!["Mexican"]);
    assert_eq!(names(&body["data"]["ingredients"]), vec!["Tortilla"]);

    // An empty list clears the links
    let (status, body) = app.patch(&uri, &token, json!({"ingredients": []})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ingredients"], json!([]));
    assert_eq!(names(&body["data"]["tags"]), vec!["Mexican"]);
}

#[tokio::test]
async fn test_patch_clears_optional_text() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app
        .create_recipe(
            &token,
            json!({
                "title": "Toast", "time_minutes": 2, "price": "1.00",
                "description": "Crunchy", "link": "https://example.com/toast"
            }),
        )
        .await;
    let uri = format!("/api/recipes/{id}");

    let (status, _) = app.patch(&uri, &token, json!({"link": null})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&uri, &token).await;
    assert!(body["data"]["link"].is_null());
    assert_eq!(body["data"]["description"], "Crunchy");
}

#[tokio::test]
async fn test_owner_cannot_be_reassigned() {
    let app = spawn_app().await;
    let alice = app.user("alice@example.com").await;
    let bob = app.user("bob@example.com").await;

    let id = app.create_recipe(&alice, sample("Soup")).await;

    let (status, _) = app
        .patch(
            &format!("/api/recipes/{id}"),
            &alice,
            json!({"user": 2, "user_id": 2, "title": "Broth"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/recipes", &alice).await;
    assert_eq!(names_of_titles(&body["data"]), vec!["Broth"]);

    let (_, body) = app.get("/api/recipes", &bob).await;
    assert_eq!(body["data"], json!([]));
}

fn names_of_titles(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_other_users_recipe_is_not_found() {
    let app = spawn_app().await;
    let alice = app.user("alice@example.com").await;
    let bob = app.user("bob@example.com").await;

    let id = app.create_recipe(&alice, sample("Soup")).await;
    let uri = format!("/api/recipes/{id}");

    let (status, _) = app.get(&uri, &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.patch(&uri, &bob, json!({"title": "Mine"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri, &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get(&uri, &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Soup");
}

#[tokio::test]
async fn test_put_requires_all_core_fields() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app.create_recipe(&token, sample("Soup")).await;
    let uri = format!("/api/recipes/{id}");

    let (status, body) = app.put(&uri, &token, json!({"title": "Stew"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["price"].is_array());

    let (status, body) = app
        .put(
            &uri,
            &token,
            json!({"title": "Stew", "time_minutes": 45, "price": "9.99"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Stew");
    assert_eq!(body["data"]["time_minutes"], 45);
    assert_eq!(body["data"]["price"], "9.99");
}

#[tokio::test]
async fn test_delete_recipe() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app
        .create_recipe(
            &token,
            json!({"title": "Soup", "time_minutes": 10, "price": "5.50", "tags": [{"name": "Warm"}]}),
        )
        .await;
    let uri = format!("/api/recipes/{id}");

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The tag outlives the recipe
    let (_, tags) = app.get("/api/tags", &token).await;
    assert_eq!(names(&tags["data"]), vec!["Warm"]);
}

#[tokio::test]
async fn test_filter_by_tags_and_ingredients() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let (_, thai) = app
        .post(
            "/api/recipes",
            &token,
            json!({
                "title": "Thai Curry", "time_minutes": 30, "price": "8.00",
                "tags": [{"name": "Thai"}], "ingredients": [{"name": "Coconut"}]
            }),
        )
        .await;
    let (_, veg) = app
        .post(
            "/api/recipes",
            &token,
            json!({
                "title": "Veg Stew", "time_minutes": 40, "price": "6.00",
                "tags": [{"name": "Vegan"}], "ingredients": [{"name": "Carrot"}]
            }),
        )
        .await;
    app.create_recipe(&token, sample("Plain Rice")).await;

    let thai_id = thai["data"]["id"].as_i64().unwrap();
    let veg_id = veg["data"]["id"].as_i64().unwrap();
    let thai_tag = thai["data"]["tags"][0]["id"].as_i64().unwrap();
    let vegan_tag = veg["data"]["tags"][0]["id"].as_i64().unwrap();
    let coconut = thai["data"]["ingredients"][0]["id"].as_i64().unwrap();

    let (status, body) = app
        .get(&format!("/api/recipes?tags={thai_tag},{vegan_tag}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["data"]), vec![veg_id, thai_id]);

    let (_, body) = app
        .get(&format!("/api/recipes?ingredients={coconut}"), &token)
        .await;
    assert_eq!(ids(&body["data"]), vec![thai_id]);

    let (_, body) = app
        .get(
            &format!("/api/recipes?tags={vegan_tag}&ingredients={coconut}"),
            &token,
        )
        .await;
    assert_eq!(body["data"], json!([]));

    let (status, body) = app.get("/api/recipes?tags=abc", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["tags"].is_array());
}

#[tokio::test]
async fn test_image_upload() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app.create_recipe(&token, sample("Cake")).await;
    let upload_uri = format!("/api/recipes/{id}/upload-image");

    let (status, body) = app.upload(&upload_uri, &token, &png_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
    let url = body["data"]["image"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/uploads/recipe/"));
    assert!(url.ends_with(".png"));

    let stored = app.media_root.join(url.trim_start_matches("/media/"));
    assert!(stored.exists());

    let (_, detail) = app.get(&format!("/api/recipes/{id}"), &token).await;
    assert_eq!(detail["data"]["image"], url.as_str());

    // Rejected upload leaves the current image in place
    let (status, body) = app.upload(&upload_uri, &token, b"definitely not an image").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["image"].is_array());

    let (_, detail) = app.get(&format!("/api/recipes/{id}"), &token).await;
    assert_eq!(detail["data"]["image"], url.as_str());
    assert!(stored.exists());

    // A replacement removes the previous file
    let (status, body) = app.upload(&upload_uri, &token, &png_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["data"]["image"], url.as_str());
    assert!(!stored.exists());
}

#[tokio::test]
async fn test_image_upload_for_missing_recipe() {
    let app = spawn_app().await;
    let alice = app.user("alice@example.com").await;
    let bob = app.user("bob@example.com").await;

    let id = app.create_recipe(&alice, sample("Cake")).await;

    let (status, _) = app
        .upload(&format!("/api/recipes/{id}/upload-image"), &bob, &png_bytes())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_upload_rejects_corrupted_payload() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app.create_recipe(&token, sample("Cake")).await;
    let upload_uri = format!("/api/recipes/{id}/upload-image");

    let mut jpeg = vec![0xFF, 0xD8, 0xFF];
    jpeg.extend_from_slice(b"this is plain text, not a jpeg");
    let (status, body) = app.upload(&upload_uri, &token, &jpeg).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["image"].is_array());

    let mut png = png_bytes();
    png.truncate(png.len() / 2);
    let (status, _) = app.upload(&upload_uri, &token, &png).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, detail) = app.get(&format!("/api/recipes/{id}"), &token).await;
    assert!(detail["data"]["image"].is_null());
    assert!(!app.media_root.join("uploads/recipe").exists());
}

#[tokio::test]
async fn test_delete_recipe_removes_image_file() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app.create_recipe(&token, sample("Cake")).await;

    let (status, body) = app
        .upload(&format!("/api/recipes/{id}/upload-image"), &token, &png_bytes())
        .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["image"].as_str().unwrap();
    let stored = app.media_root.join(url.trim_start_matches("/media/"));
    assert!(stored.exists());

    let (status, _) = app.delete(&format!("/api/recipes/{id}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!stored.exists());
}

#[tokio::test]
async fn test_blank_description_round_trips_as_empty() {
    let app = spawn_app().await;
    let token = app.user("cook@example.com").await;

    let id = app
        .create_recipe(
            &token,
            json!({"title": "Tea", "time_minutes": 3, "price": "0.50", "description": ""}),
        )
        .await;

    let (_, body) = app.get(&format!("/api/recipes/{id}"), &token).await;
    assert_eq!(body["data"]["description"], "");
}
