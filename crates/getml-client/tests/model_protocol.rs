//! Model sessions against a fake engine.

mod support;

use getml_client::models::FrameSource;
use getml_client::{AnyModel, ClientError};
use getml_core::models::{ModelKind, RelboostParams};
use getml_config::EngineConfig;
use getml_core::placeholder::{Join, Placeholder};
use getml_core::table::Table;
use getml_core::{Role, Schema};
use ndarray::array;
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{Step, column, found, recv, reply, serve, serve_with, success};

const DESCRIPTION: &str = r#"{
    "hyperparameters_": {"num_features_": 10, "shrinkage_": 0.1, "engine_only_": true},
    "placeholder_": {"name_": "population"},
    "population_schema_": {"join_keys_": ["id"], "time_stamps_": ["ts"], "targets_": ["y"]},
    "peripheral_": ["perip"],
    "peripheral_schema_": [{"join_keys_": ["id"], "time_stamps_": ["ts"], "numericals_": ["x"]}]
}"#;

fn population() -> Placeholder {
    Placeholder::new(
        "population",
        Schema::default()
            .with(Role::JoinKey, ["id"])
            .with(Role::TimeStamp, ["ts"])
            .with(Role::Target, ["y"]),
    )
}

fn peripheral() -> Placeholder {
    Placeholder::new(
        "perip",
        Schema::default()
            .with(Role::JoinKey, ["id"])
            .with(Role::TimeStamp, ["ts"])
            .with(Role::Numerical, ["x"]),
    )
}

/// Steps of one temporary frame upload with the given column payloads.
fn upload(payloads: &[Step]) -> Vec<Step> {
    let mut steps = vec![recv(), success()];
    for payload in payloads {
        steps.extend([recv(), payload.clone(), success()]);
    }
    steps.extend([recv(), success()]);
    steps
}

#[tokio::test]
async fn send_describes_data_model_and_hyperparameters() {
    let fake = serve(vec![vec![recv(), success()]]).await;
    let model = fake
        .engine
        .model(RelboostParams::default())
        .with_name("churn")
        .with_data_model(population(), vec![peripheral()]);

    model.send().await.unwrap();

    let command = fake.received().await[0][0].json();
    assert_eq!(command["type_"], json!("RelboostModel"));
    assert_eq!(command["name_"], json!("churn"));
    assert_eq!(command["population_"]["name_"], json!("population"));
    assert_eq!(command["population_"]["targets_"], json!(["y"]));
    assert_eq!(command["peripheral_"], json!(["perip"]));
    assert_eq!(command["hyperparameters_"]["num_features_"], json!(100));
}

#[tokio::test]
async fn send_without_data_model_is_rejected() {
    let fake = serve(vec![]).await;
    let model = fake.engine.model(RelboostParams::default());

    let err = model.send().await.unwrap_err();
    assert!(matches!(err, ClientError::MissingPlaceholder("Population")));
    assert!(fake.received().await.is_empty());
}

#[tokio::test]
async fn fit_on_engine_frames_saves_and_refreshes() {
    let fake = serve(vec![
        vec![
            recv(),
            found(),
            recv(),
            reply("Trained RelboostModel 'churn'."),
            recv(),
            success(),
        ],
        vec![recv(), success()],
        vec![recv(), reply(DESCRIPTION)],
    ])
    .await;
    let population_df = fake.engine.data_frame("pop_train", population().schema);
    let peripheral_df = fake.engine.data_frame("perip", peripheral().schema);
    let mut model = fake.engine.model(RelboostParams::default()).with_name("churn");

    model
        .fit(FrameSource::from(&population_df), &[FrameSource::from(&peripheral_df)])
        .await
        .unwrap();

    assert_eq!(model.params().num_features, 10);
    assert_eq!(model.population().unwrap().schema.targets, vec!["y"]);
    assert_eq!(model.peripheral().unwrap()[0].schema.numerical, vec!["x"]);

    let received = fake.received().await;
    assert_eq!(received[0][0].json(), json!({"type_": "RelboostModel.fit", "name_": "churn"}));
    let fit = received[0][1].json();
    assert_eq!(fit["peripheral_names_"], json!(["perip"]));
    assert_eq!(fit["population_name_"], json!("pop_train"));
    assert_eq!(received[0][2].json()["type_"], json!("RelboostModel.close"));
    assert_eq!(received[1][0].json()["type_"], json!("RelboostModel.save"));
    assert_eq!(received[2][0].json()["type_"], json!("RelboostModel.refresh"));
}

#[tokio::test]
async fn fitting_twice_skips_the_close() {
    let fake = serve(vec![
        vec![recv(), found(), recv(), reply("RelboostModel 'churn' has already been fitted.")],
        vec![recv(), success()],
        vec![recv(), reply(DESCRIPTION)],
    ])
    .await;
    let population_df = fake.engine.data_frame("pop_train", population().schema);
    let mut model = fake.engine.model(RelboostParams::default()).with_name("churn");

    model.fit(FrameSource::from(&population_df), &[]).await.unwrap();

    let types = fake.command_types().await;
    assert_eq!(types, vec!["RelboostModel.fit", "RelboostModel.save", "RelboostModel.refresh"]);
}

#[tokio::test]
async fn failed_fit_reports_the_engine_message() {
    let fake = serve(vec![vec![recv(), found(), recv(), reply("Out of memory!")]]).await;
    let population_df = fake.engine.data_frame("pop_train", population().schema);
    let mut model = fake.engine.model(RelboostParams::default()).with_name("churn");

    let err = model.fit(FrameSource::from(&population_df), &[]).await.unwrap_err();
    assert_eq!(err.to_string(), "Out of memory!");
}

#[tokio::test]
async fn transform_uploads_local_tables_as_temporary_frames() {
    let mut session = vec![recv(), found()];
    session.extend(upload(&[Step::RecvCategorical, Step::RecvMatrix, Step::RecvMatrix]));
    session.extend(upload(&[Step::RecvCategorical, Step::RecvMatrix]));
    session.extend([
        recv(),
        success(),
        Step::SendMatrix(array![[0.5, 1.0], [0.25, 2.0]]),
        recv(),
        success(),
    ]);
    let fake = serve(vec![session]).await;

    let population_table = Table::new()
        .with_column("id", vec!["a", "b"])
        .unwrap()
        .with_column("ts", vec![1.0, 2.0])
        .unwrap();
    let peripheral_table = Table::new()
        .with_column("id", vec!["a", "a", "b"])
        .unwrap()
        .with_column("ts", vec![0.5, 0.75, 1.5])
        .unwrap()
        .with_column("x", vec![1.0, 2.0, 3.0])
        .unwrap();
    let model = fake
        .engine
        .model(RelboostParams::default())
        .with_name("churn")
        .with_data_model(population(), vec![peripheral()]);

    let features = model
        .transform(
            FrameSource::from(&population_table),
            &[FrameSource::from(&peripheral_table)],
            "",
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(features, array![[0.5, 1.0], [0.25, 2.0]]);

    let received = fake.received().await.remove(0);
    let peripheral_name = received[1].json()["name_"].as_str().unwrap().to_string();
    assert!(peripheral_name.starts_with("temp-"));

    // peripheral: 1 + 3 * 2 + 1 messages, population: 1 + 2 * 2 + 1
    let population_upload = &received[9..15];
    let population_name = population_upload[0].json()["name_"].as_str().unwrap().to_string();
    let uploaded: Vec<String> = [1, 3]
        .iter()
        .map(|index| population_upload[*index].json()["name_"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(uploaded, vec!["id", "ts"]);

    let transform = received[15].json();
    assert_eq!(transform["type_"], json!("RelboostModel.transform"));
    assert_eq!(transform["score_"], json!(false));
    assert_eq!(transform["predict_"], json!(false));
    assert_eq!(transform["table_name_"], json!(""));
    assert_eq!(transform["peripheral_names_"], json!([peripheral_name]));
    assert_eq!(transform["population_name_"], json!(population_name));
    assert_eq!(received[16].json()["type_"], json!("RelboostModel.close"));
}

#[tokio::test]
async fn local_table_without_placeholder_is_rejected() {
    let fake = serve(vec![vec![recv(), found()]]).await;
    let table = Table::new().with_column("id", vec!["a"]).unwrap();
    let model = fake.engine.model(RelboostParams::default()).with_name("churn");

    let err = model
        .predict(FrameSource::from(&table), &[], "")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Population cannot be None!");
}

#[tokio::test]
async fn score_compares_predictions_with_targets() {
    let fake = serve(vec![
        vec![
            recv(),
            found(),
            recv(),
            success(),
            Step::SendMatrix(array![[0.9], [0.1]]),
            recv(),
            found(),
            column(&[1.0, 0.0]),
            recv(),
            success(),
        ],
        vec![
            recv(),
            found(),
            Step::RecvMatrix,
            Step::RecvMatrix,
            success(),
            reply(r#"{"rmse_": [0.1], "mae_": [0.1], "rsquared_": [0.96]}"#),
        ],
        vec![recv(), success()],
    ])
    .await;
    let population_df = fake.engine.data_frame("pop_test", population().schema);
    let model = fake.engine.model(RelboostParams::default()).with_name("churn");

    let scores = model.score(FrameSource::from(&population_df), &[]).await.unwrap();
    assert_eq!(scores.metric("rmse"), Some(vec![0.1]));

    let received = fake.received().await;
    let transform = received[0][1].json();
    assert_eq!(transform["score_"], json!(true));
    assert_eq!(transform["predict_"], json!(true));
    let target = received[0][2].json();
    assert_eq!(target["type_"], json!("Column.get"));
    assert_eq!(target["col_"]["name_"], json!("y"));
    assert_eq!(received[1][0].json()["type_"], json!("RelboostModel.score"));
    assert_eq!(received[1][1].matrix(), &array![[0.9], [0.1]]);
    assert_eq!(received[1][2].matrix(), &array![[1.0], [0.0]]);
    assert_eq!(received[2][0].json()["type_"], json!("RelboostModel.save"));
}

#[tokio::test]
async fn to_sql_reads_after_found() {
    let fake = serve(vec![vec![recv(), found(), reply("CREATE TABLE FEATURE_1 ...")]]).await;
    let model = fake.engine.model(RelboostParams::default()).with_name("churn");

    assert_eq!(model.to_sql().await.unwrap(), "CREATE TABLE FEATURE_1 ...");
}

#[tokio::test]
async fn get_model_refreshes_the_reported_kind() {
    let fake = serve(vec![
        vec![recv(), reply("RelboostModel")],
        vec![recv(), reply(DESCRIPTION)],
        vec![recv(), reply("Model 'gone' does not exist!")],
    ])
    .await;

    let model = fake.engine.get_model("churn").await.unwrap();
    assert_eq!(model.kind(), ModelKind::Relboost);
    assert_eq!(model.name(), "churn");
    match &model {
        AnyModel::Relboost(relboost) => assert_eq!(relboost.params().num_features, 10),
        AnyModel::Multirel(_) => panic!("expected a Relboost model"),
    }

    let err = fake.engine.get_model("gone").await.unwrap_err();
    assert!(matches!(err, ClientError::Engine(_)));

    let received = fake.received().await;
    assert_eq!(received[0][0].json(), json!({"type_": "get_model", "name_": "churn"}));
}

#[tokio::test]
async fn fit_waits_past_the_read_timeout() {
    let config = EngineConfig {
        read_timeout_secs: 1,
        ..EngineConfig::default()
    };
    let fake = serve_with(
        vec![
            vec![
                recv(),
                found(),
                recv(),
                Step::Delay(std::time::Duration::from_millis(1500)),
                reply("Trained RelboostModel 'churn'."),
                recv(),
                success(),
            ],
            vec![recv(), success()],
            vec![recv(), reply(DESCRIPTION)],
        ],
        config,
    )
    .await;
    let population_df = fake.engine.data_frame("pop_train", population().schema);
    let peripheral_df = fake.engine.data_frame("perip", peripheral().schema);
    let mut model = fake.engine.model(RelboostParams::default()).with_name("churn");

    model
        .fit(FrameSource::from(&population_df), &[FrameSource::from(&peripheral_df)])
        .await
        .unwrap();
}

#[tokio::test]
async fn snowflake_joined_top_down_is_sent_whole() {
    let fake = serve(vec![vec![recv(), success()]]).await;
    let mut population = population();
    let orders = peripheral();
    let items = Placeholder::new(
        "items",
        Schema::default()
            .with(Role::JoinKey, ["order_id"])
            .with(Role::TimeStamp, ["ts"]),
    );
    let peripheral = vec![orders.clone(), items.clone()];

    population
        .join(orders, Join::on("id", "ts"))
        .unwrap()
        .join(items, Join::on("order_id", "ts"))
        .unwrap();
    let model = fake
        .engine
        .model(RelboostParams::default())
        .with_name("churn")
        .with_data_model(population, peripheral);
    model.send().await.unwrap();

    let command = fake.received().await[0][0].json();
    let orders = &command["population_"]["joined_tables_"][0];
    assert_eq!(orders["name_"], json!("perip"));
    assert_eq!(orders["join_keys_used_"], json!(["order_id"]));
    assert_eq!(orders["joined_tables_"][0]["name_"], json!("items"));
    assert_eq!(command["peripheral_"], json!(["perip", "items"]));
}
