//! Copy, duplicate and clone with reference closures.

mod common;

use common::{create_branch, reference, TestApp};
use configuration_service::services::ClosurePolicy;
use serde_json::{json, Value};
use std::collections::HashSet;

#[tokio::test]
async fn clone_copies_reference_chain_and_rewrites_links() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let c = app.create_configuration(&branch.app, "C", json!({})).await;
    let b = app
        .create_configuration(&branch.app, "B", json!({ "next": reference(&c) }))
        .await;
    let a = app
        .create_configuration(&branch.app, "A", json!({ "next": reference(&b) }))
        .await;

    let response = app
        .post(
            &format!("/configurations/{}/clone", a),
            &json!({ "destinationNodeId": branch.city }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let report: Value = response.json().await.expect("Failed to parse JSON");

    let cloned = report["cloned"].as_array().expect("cloned");
    let originals: Vec<&str> = cloned
        .iter()
        .map(|c| c["originalId"].as_str().unwrap())
        .collect();
    assert_eq!(originals, vec![c.as_str(), b.as_str(), a.as_str()]);
    assert_eq!(app.configuration_count().await, 6);

    let new_a = report["newRootId"].as_str().unwrap();
    let a_copy = app.configuration(new_a).await;
    assert_eq!(a_copy["parentId"], branch.city.as_str());
    assert_eq!(a_copy["sourceNode"], "City1");

    let new_b = a_copy["setting"]["next"]["configRef"].as_str().unwrap().to_string();
    assert_ne!(new_b, b);
    let b_copy = app.configuration(&new_b).await;
    assert_eq!(b_copy["parentId"], branch.city.as_str());
    let new_c = b_copy["setting"]["next"]["configRef"].as_str().unwrap().to_string();
    assert_ne!(new_c, c);

    // Originals keep pointing at originals.
    assert_eq!(app.configuration(&a).await["setting"]["next"]["configRef"], b.as_str());
}

#[tokio::test]
async fn clone_terminates_on_cycles() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let x = app.create_configuration(&branch.app, "X", json!({})).await;
    let y = app
        .create_configuration(&branch.app, "Y", json!({ "back": reference(&x) }))
        .await;
    let update = json!({
        "componentType": "Button",
        "componentSubType": "Primary",
        "label": "X",
        "setting": { "forward": reference(&y) },
    });
    let response = app
        .put(&format!("/nodes/{}/configurations/{}", branch.app, x), &update)
        .await;
    assert!(response.status().is_success());

    let report: Value = app
        .post(
            &format!("/configurations/{}/clone", x),
            &json!({ "destinationNodeId": branch.city }),
        )
        .await
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(report["cloned"].as_array().unwrap().len(), 2);
    let new_x = report["newRootId"].as_str().unwrap();
    let x_copy = app.configuration(new_x).await;
    let new_y = x_copy["setting"]["forward"]["configRef"].as_str().unwrap();
    let y_copy = app.configuration(new_y).await;
    assert_eq!(y_copy["setting"]["back"]["configRef"], new_x);
}

#[tokio::test]
async fn clone_with_dangling_reference_fails() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let holder = app
        .create_configuration(&branch.app, "Holder", json!({ "next": reference("ghost") }))
        .await;

    let closure = app.get(&format!("/configurations/{}/closure", holder)).await;
    assert_eq!(closure.status().as_u16(), 404);

    let response = app
        .post(
            &format!("/configurations/{}/clone", holder),
            &json!({ "destinationNodeId": branch.city }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn clone_to_unknown_node_is_not_found() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let cfg = app.create_configuration(&branch.app, "A", json!({})).await;

    let response = app
        .post(
            &format!("/configurations/{}/clone", cfg),
            &json!({ "destinationNodeId": "nope" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(app.configuration_count().await, 1);
}

#[tokio::test]
async fn closure_preview_lists_members_root_first() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let c = app.create_configuration(&branch.app, "C", json!({})).await;
    let b = app
        .create_configuration(&branch.app, "B", json!({ "next": reference(&c) }))
        .await;
    let unrelated = app.create_configuration(&branch.app, "U", json!({})).await;

    let preview: Value = app
        .get(&format!("/configurations/{}/closure", b))
        .await
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(preview["rootId"], b.as_str());
    assert_eq!(preview["members"], json!([b, c]));
    assert!(!preview["members"].as_array().unwrap().contains(&json!(unrelated)));
}

async fn shared_target_fixture(app: &TestApp) -> (common::Branch, String, String, String) {
    let branch = create_branch(app).await;
    let shared = app.create_configuration(&branch.app, "Shared", json!({})).await;
    let first = app
        .create_configuration(&branch.app, "First", json!({ "dep": reference(&shared) }))
        .await;
    let second = app
        .create_configuration(&branch.app, "Second", json!({ "dep": reference(&shared) }))
        .await;
    (branch, shared, first, second)
}

#[tokio::test]
async fn isolated_copy_clones_shared_target_per_selection() {
    let app = TestApp::spawn().await;
    let (branch, _, first, second) = shared_target_fixture(&app).await;

    let response = app
        .post(
            &format!("/nodes/{}/configurations/copy", branch.app),
            &json!({ "configurationIds": [first, second], "destinationNodeId": branch.city }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["policy"], "isolated");

    // 3 originals + 2 roots + 2 private copies of the shared target.
    assert_eq!(app.configuration_count().await, 7);

    let targets: HashSet<String> = body["copies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|report| report["newRootId"].as_str().unwrap().to_string())
        .collect();
    let mut deps = HashSet::new();
    for id in &targets {
        let copy = app.configuration(id).await;
        deps.insert(copy["setting"]["dep"]["configRef"].as_str().unwrap().to_string());
    }
    assert_eq!(deps.len(), 2);
}

#[tokio::test]
async fn shared_copy_clones_shared_target_once() {
    let app = TestApp::spawn().await;
    let (branch, _, first, second) = shared_target_fixture(&app).await;

    let response = app
        .post(
            &format!("/nodes/{}/configurations/copy", branch.app),
            &json!({
                "configurationIds": [first, second],
                "destinationNodeId": branch.city,
                "policy": "shared",
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["policy"], "shared");

    assert_eq!(app.configuration_count().await, 6);

    let copies = body["copies"].as_array().unwrap();
    assert_eq!(copies[0]["cloned"].as_array().unwrap().len(), 2);
    assert_eq!(copies[1]["cloned"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn default_policy_comes_from_configuration() {
    let app = TestApp::spawn_with_policy(ClosurePolicy::Shared).await;
    let (branch, _, first, second) = shared_target_fixture(&app).await;

    let body: Value = app
        .post(
            &format!("/nodes/{}/configurations/copy", branch.app),
            &json!({ "configurationIds": [first, second], "destinationNodeId": branch.city }),
        )
        .await
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(body["policy"], "shared");
    assert_eq!(app.configuration_count().await, 6);
}

#[tokio::test]
async fn copy_of_inherited_configuration_is_forbidden() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let inherited = app.create_configuration(&branch.app, "A", json!({})).await;

    let response = app
        .post(
            &format!("/nodes/{}/configurations/copy", branch.city),
            &json!({ "configurationIds": [inherited], "destinationNodeId": branch.region }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(app.configuration_count().await, 1);
}

#[tokio::test]
async fn duplicate_clones_onto_the_same_node() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let target = app.create_configuration(&branch.city, "Target", json!({})).await;
    let holder = app
        .create_configuration(&branch.city, "Holder", json!({ "dep": reference(&target) }))
        .await;

    let response = app
        .post(
            &format!("/nodes/{}/configurations/duplicate", branch.city),
            &json!({ "configurationIds": [holder] }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["destinationNodeId"], branch.city.as_str());

    let visible = app.visible_ids(&branch.city).await;
    assert_eq!(visible.len(), 4);

    let new_holder = body["copies"][0]["newRootId"].as_str().unwrap();
    let copy = app.configuration(new_holder).await;
    assert_eq!(copy["label"], "Holder");
    assert_ne!(copy["setting"]["dep"]["configRef"], target.as_str());
}

#[tokio::test]
async fn clone_keeps_active_setting_in_sync() {
    let app = TestApp::spawn().await;
    let branch = create_branch(&app).await;
    let target = app.create_configuration(&branch.app, "Target", json!({})).await;
    let response = app
        .post(
            &format!("/nodes/{}/configurations", branch.app),
            &json!({
                "componentType": "Button",
                "componentSubType": "Primary",
                "label": "Holder",
                "settings": [{ "id": "s1", "dep": reference(&target) }],
                "activeSettingId": "s1",
            }),
        )
        .await;
    let holder: Value = response.json().await.expect("Failed to parse JSON");

    let report: Value = app
        .post(
            &format!("/configurations/{}/clone", holder["id"].as_str().unwrap()),
            &json!({ "destinationNodeId": branch.city }),
        )
        .await
        .json()
        .await
        .expect("Failed to parse JSON");

    let copy = app.configuration(report["newRootId"].as_str().unwrap()).await;
    assert_eq!(copy["activeSetting"], copy["settings"][0]);
    assert_ne!(copy["activeSetting"]["dep"]["configRef"], target.as_str());
}
