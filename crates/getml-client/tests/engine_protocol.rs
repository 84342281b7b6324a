//! Engine-level commands against a scripted fake engine.

mod support;

use getml_client::ClientError;
use getml_config::EngineConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{Step, recv, reply, serve, serve_with, success};

#[tokio::test]
async fn set_project_checks_liveness_first() {
    let fake = serve(vec![vec![recv()], vec![recv(), success()]]).await;
    fake.engine.set_project("churn").await.unwrap();

    let received = fake.received().await;
    assert_eq!(received[0][0].json(), json!({"type_": "is_alive", "name_": ""}));
    assert_eq!(received[1][0].json(), json!({"type_": "set_project", "name_": "churn"}));
}

#[tokio::test]
async fn engine_error_message_is_passed_through() {
    let fake = serve(vec![vec![recv(), reply("Project 'x' does not exist!")]]).await;
    let err = fake.engine.delete_project("x").await.unwrap_err();

    assert!(matches!(err, ClientError::Engine(_)));
    assert_eq!(err.to_string(), "Project 'x' does not exist!");
}

#[tokio::test]
async fn list_projects_reads_json_after_success() {
    let fake = serve(vec![vec![
        recv(),
        success(),
        reply(r#"{"projects":["churn","sales"]}"#),
    ]])
    .await;
    let projects = fake.engine.list_projects().await.unwrap();

    assert_eq!(projects, vec!["churn".to_string(), "sales".to_string()]);
    assert_eq!(fake.command_types().await, vec!["list_projects"]);
}

#[tokio::test]
async fn listings_are_returned_as_reported() {
    let fake = serve(vec![
        vec![recv(), success(), reply(r#"{"in_memory":["df"],"in_project_folder":[]}"#)],
        vec![recv(), success(), reply(r#"{"multirel_models":[],"relboost_models":["m"]}"#)],
    ])
    .await;
    let frames = fake.engine.list_data_frames().await.unwrap();
    let models = fake.engine.list_models().await.unwrap();

    assert_eq!(frames["in_memory"], json!(["df"]));
    assert_eq!(models["relboost_models"], json!(["m"]));
}

#[tokio::test]
async fn shutdown_reads_no_reply() {
    let fake = serve(vec![vec![recv()]]).await;
    fake.engine.shutdown().await.unwrap();

    let received = fake.received().await;
    assert_eq!(received[0][0].json(), json!({"type_": "shutdown", "name_": "all"}));
}

#[tokio::test]
async fn silent_engine_hits_the_read_timeout() {
    let config = EngineConfig {
        read_timeout_secs: 1,
        ..EngineConfig::default()
    };
    let fake = serve_with(vec![vec![recv(), Step::Stall]], config).await;

    let err = fake.engine.list_projects().await.unwrap_err();
    assert!(matches!(err, ClientError::ReadTimeout { secs: 1 }));
}
