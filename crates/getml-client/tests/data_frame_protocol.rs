//! Data frame uploads, downloads and derived frames against a fake engine.

mod support;

use getml_client::ClientError;
use getml_core::table::{Series, Table};
use getml_core::{Role, Schema};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{Step, column, found, recv, reply, serve, success};

fn schema() -> Schema {
    Schema::default()
        .with(Role::Categorical, ["city"])
        .with(Role::JoinKey, ["id"])
        .with(Role::Numerical, ["x"])
        .with(Role::TimeStamp, ["ts"])
}

fn table() -> Table {
    Table::new()
        .with_column("ts", vec!["1970-01-02", "1970-01-04"])
        .unwrap()
        .with_column("x", vec![1.5, f64::NAN])
        .unwrap()
        .with_column("id", vec!["a", "b"])
        .unwrap()
        .with_column("city", vec!["Berlin", "Paris"])
        .unwrap()
}

fn upload_column(payload: Step) -> Vec<Step> {
    vec![recv(), payload, success()]
}

#[tokio::test]
async fn send_streams_columns_in_role_order() {
    let mut script = vec![recv(), success()];
    script.extend(upload_column(Step::RecvCategorical));
    script.extend(upload_column(Step::RecvCategorical));
    script.extend(upload_column(Step::RecvMatrix));
    script.extend(upload_column(Step::RecvMatrix));
    script.extend([recv(), success()]);
    let fake = serve(vec![script]).await;

    let frame = fake.engine.data_frame("trips", schema());
    frame.send(&table()).await.unwrap();

    let received = fake.received().await.remove(0);
    assert_eq!(received[0].json(), json!({"type_": "DataFrame", "name_": "trips"}));

    let columns: Vec<String> = [1, 4, 7, 10]
        .iter()
        .map(|index| received[*index].json()["name_"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(columns, vec!["city", "id", "x", "ts"]);
    assert_eq!(received[4].json()["role_"], json!("join_key"));

    assert_eq!(received[2].categorical().iter().cloned().collect::<Vec<_>>(), vec!["Berlin", "Paris"]);
    let days: Vec<f64> = received[11].matrix().iter().copied().collect();
    assert_eq!(days, vec![1.0, 3.0]);
    assert!(received[8].matrix()[[1, 0]].is_nan());

    assert_eq!(received[13].json(), json!({"type_": "DataFrame.close", "name_": "trips"}));
}

#[tokio::test]
async fn implausible_table_fails_before_connecting() {
    let fake = serve(vec![]).await;
    let frame = fake.engine.data_frame("trips", Schema::default().with(Role::TimeStamp, ["ts"]));

    let err = frame.send(&table()).await.unwrap_err();
    assert_eq!(err.to_string(), "You need to provide at least one join key!");
    assert!(fake.received().await.is_empty());
}

#[tokio::test]
async fn rejected_column_surfaces_engine_message() {
    let fake = serve(vec![vec![
        recv(),
        success(),
        recv(),
        Step::RecvCategorical,
        reply("Column 'city' has the wrong length!"),
    ]])
    .await;
    let frame = fake.engine.data_frame("trips", schema());

    let err = frame.send(&table()).await.unwrap_err();
    assert!(matches!(err, ClientError::Engine(message) if message.contains("wrong length")));
}

#[tokio::test]
async fn get_decodes_time_stamps() {
    let fake = serve(vec![vec![
        recv(),
        recv(),
        found(),
        Step::SendCategorical(vec!["a".into(), "b".into()]),
        recv(),
        found(),
        column(&[0.0, 1.0]),
        recv(),
        success(),
    ]])
    .await;
    let frame = fake.engine.data_frame(
        "events",
        Schema::default().with(Role::JoinKey, ["id"]).with(Role::TimeStamp, ["ts"]),
    );

    let local = frame.get().await.unwrap();
    assert_eq!(local.shape(), (2, 2));
    match local.column("ts").unwrap() {
        Series::TimeStamp(stamps) => {
            assert_eq!(stamps[1].to_string(), "1970-01-02 00:00:00");
        }
        other => panic!("expected time stamps, got {other:?}"),
    }

    let received = fake.received().await.remove(0);
    assert_eq!(received[0].json()["type_"], json!("DataFrame.get"));
    assert_eq!(received[1].json()["type_"], json!("CategoricalColumn.get"));
    assert_eq!(received[2].json()["type_"], json!("Column.get"));
    assert_eq!(received[3].json()["type_"], json!("DataFrame.close"));
}

#[tokio::test]
async fn refresh_replaces_the_schema() {
    let fake = serve(vec![vec![
        recv(),
        reply(r#"{"categorical_":"","discrete_":"","join_keys_":["id"],"numerical_":["x","y"],"targets_":"","time_stamps_":["ts"]}"#),
    ]])
    .await;
    let mut frame = fake.engine.data_frame("trips", Schema::default());

    frame.refresh().await.unwrap();
    assert_eq!(frame.numerical_names(), ["x".to_string(), "y".to_string()]);
    assert_eq!(frame.n_targets(), 0);
}

#[tokio::test]
async fn refresh_rejects_non_json_reply() {
    let fake = serve(vec![vec![recv(), reply("DataFrame 'nope' does not exist!")]]).await;
    let mut frame = fake.engine.data_frame("nope", Schema::default());

    let err = frame.refresh().await.unwrap_err();
    assert_eq!(err.to_string(), "DataFrame 'nope' does not exist!");
}

#[tokio::test]
async fn n_rows_parses_the_count() {
    let fake = serve(vec![
        vec![recv(), found(), reply("42")],
        vec![recv(), found(), reply("many")],
    ])
    .await;
    let frame = fake.engine.data_frame("trips", schema());

    assert_eq!(frame.n_rows().await.unwrap(), 42);
    assert!(matches!(frame.n_bytes().await.unwrap_err(), ClientError::Protocol(_)));
}

#[tokio::test]
async fn where_creates_and_refreshes_a_new_frame() {
    let fake = serve(vec![
        vec![recv(), success()],
        vec![recv(), reply(r#"{"join_keys_":["id"],"time_stamps_":["ts"],"numerical_":["x"]}"#)],
    ])
    .await;
    let frame = fake.engine.data_frame("trips", schema());
    let condition = frame.numerical("x").unwrap().greater(1.0);

    let filtered = frame.where_("long_trips", &condition).await.unwrap();
    assert_eq!(filtered.name(), "long_trips");
    assert_eq!(filtered.n_numerical(), 1);

    let received = fake.received().await;
    let command = received[0][0].json();
    assert_eq!(command["type_"], json!("DataFrame.where"));
    assert_eq!(command["name_"], json!("trips"));
    assert_eq!(command["new_df_"], json!("long_trips"));
    assert_eq!(command["condition_"]["operator_"], json!("greater"));
    assert_eq!(received[1][0].json()["name_"], json!("long_trips"));
}

#[tokio::test]
async fn add_numerical_records_the_unit() {
    let fake = serve(vec![
        vec![recv(), success()],
        vec![recv(), reply(r#"{"join_keys_":["id"],"time_stamps_":["ts"],"numerical_":["x","x2"]}"#)],
    ])
    .await;
    let mut frame = fake.engine.data_frame("trips", schema());
    let doubled = frame.numerical("x").unwrap() * 2.0;

    frame.add_numerical(&doubled, "x2", "km").await.unwrap();
    assert_eq!(frame.numerical("x2").unwrap().unit(), Some("km"));

    let received = fake.received().await;
    let command = received[0][0].json();
    assert_eq!(command["type_"], json!("DataFrame.add_column"));
    assert_eq!(command["name_"], json!("x2"));
    assert_eq!(command["df_name_"], json!("trips"));
    assert_eq!(command["role_"], json!("numerical"));
    assert_eq!(command["unit_"], json!("km"));
}

#[tokio::test]
async fn from_json_sends_the_document_on_the_same_connection() {
    let fake = serve(vec![vec![recv(), recv(), success()]]).await;
    let frame = fake.engine.data_frame("trips", schema());

    frame.from_table(&table(), false).await.unwrap();

    let received = fake.received().await.remove(0);
    let command = received[0].json();
    assert_eq!(command["type_"], json!("DataFrame.from_json"));
    assert_eq!(command["append_"], json!(false));
    assert_eq!(command["join_keys_"], json!(["id"]));
    assert_eq!(received[1].json()["city"], json!(["Berlin", "Paris"]));
}

#[tokio::test]
async fn column_header_larger_than_its_payload_is_connection_broken() {
    let mut header = (1_i32 << 20).to_be_bytes().to_vec();
    header.extend_from_slice(&(1_i32 << 20).to_be_bytes());
    header.extend_from_slice(&2.5_f64.to_be_bytes());
    let fake = serve(vec![vec![recv(), found(), Step::SendRaw(header)]]).await;
    let frame = fake.engine.data_frame("df", schema());

    let err = fake
        .engine
        .get_column(&frame.numerical("x").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ConnectionBroken));
}
