//! Hyperparameter searches against a fake engine.

mod support;

use getml_client::{ClientError, HyperoptSearch};
use getml_core::hyperopt::{ParamSpace, SearchKind};
use getml_core::loss_functions::LossFunction;
use getml_core::models::RelboostParams;
use getml_core::predictors::Predictor;
use getml_core::{Role, Schema};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{found, recv, reply, serve, success};

fn params() -> RelboostParams {
    RelboostParams {
        loss_function: LossFunction::CrossEntropyLoss,
        predictor: Some(Predictor::logistic_regression()),
        ..RelboostParams::default()
    }
}

fn population_schema() -> Schema {
    Schema::default()
        .with(Role::JoinKey, ["id"])
        .with(Role::TimeStamp, ["ts"])
        .with(Role::Target, ["y"])
}

#[tokio::test]
async fn fit_launches_on_one_connection() {
    let fake = serve(vec![vec![recv(), found(), recv(), success()]]).await;
    let model = fake.engine.model(params()).with_name("base");
    let space = ParamSpace::new().with("max_depth", 8.0, 2.0);
    let mut search = HyperoptSearch::new(SearchKind::Random, model, Some(space))
        .unwrap()
        .with_session_name("search-1");

    let training = fake.engine.data_frame("train", population_schema());
    let validation = fake.engine.data_frame("validate", population_schema());
    let peripheral = fake.engine.data_frame("perip", Schema::default());
    search
        .fit(&training, &validation, &[&peripheral], Some("auc"))
        .await
        .unwrap();

    let received = fake.received().await.remove(0);
    assert_eq!(
        received[0].json(),
        json!({"type_": "RelboostModel.launch_hyperopt", "name_": "base"})
    );
    let command = received[1].json();
    assert_eq!(command["peripheral_names_"], json!(["perip"]));
    assert_eq!(command["population_training_name_"], json!("train"));
    assert_eq!(command["population_validation_name_"], json!("validate"));
    assert_eq!(command["session_name_"], json!("search-1"));
    assert_eq!(command["param_space_"]["max_depth"], json!([2, 8]));
    assert_eq!(command["params_"]["score"], json!("auc_"));
    assert_eq!(command["params_"]["n_iter"], json!(30));
    assert_eq!(command["params_"]["surrogate_burn_in_algorithm"], json!("random"));
}

#[tokio::test]
async fn unknown_score_falls_back_to_the_loss_default() {
    let fake = serve(vec![vec![recv(), found(), recv(), success()]]).await;
    let model = fake.engine.model(params()).with_name("base");
    let mut search = HyperoptSearch::new(SearchKind::Gaussian, model, None).unwrap();

    let training = fake.engine.data_frame("train", population_schema());
    search.fit(&training, &training, &[], Some("rmse")).await.unwrap();

    assert_eq!(search.params().score.as_deref(), Some("cross_entropy_"));
    let received = fake.received().await.remove(0);
    assert_eq!(received[1].json()["params_"]["score"], json!("cross_entropy_"));
}

#[tokio::test]
async fn mismatched_populations_are_rejected_locally() {
    let fake = serve(vec![]).await;
    let model = fake.engine.model(params()).with_name("base");
    let mut search = HyperoptSearch::new(SearchKind::Random, model, None).unwrap();

    let training = fake.engine.data_frame("train", population_schema());
    let validation = fake.engine.data_frame(
        "validate",
        population_schema().with(Role::Target, ["label"]),
    );
    let err = search.fit(&training, &validation, &[], None).await.unwrap_err();

    assert!(matches!(err, ClientError::ColumnMismatch(_)));
    assert!(fake.received().await.is_empty());
}

#[tokio::test]
async fn unknown_base_model_is_an_engine_error() {
    let fake = serve(vec![vec![recv(), reply("RelboostModel 'base' does not exist!")]]).await;
    let model = fake.engine.model(params()).with_name("base");
    let mut search = HyperoptSearch::new(SearchKind::Random, model, None).unwrap();

    let training = fake.engine.data_frame("train", population_schema());
    let err = search.fit(&training, &training, &[], None).await.unwrap_err();
    assert_eq!(err.to_string(), "RelboostModel 'base' does not exist!");
}

#[tokio::test]
async fn models_and_scores_are_looked_up_by_session() {
    let description = r#"{
        "hyperparameters_": {"max_depth_": 7},
        "placeholder_": {"name_": "population"},
        "population_schema_": {"join_keys_": ["id"], "time_stamps_": ["ts"], "targets_": ["y"]},
        "peripheral_": "",
        "peripheral_schema_": ""
    }"#;
    let fake = serve(vec![
        vec![recv(), success(), reply(r#"{"names_":["search-1-0"]}"#)],
        vec![recv(), reply(description)],
        vec![recv(), success(), reply(r#"{"search-1-0":{"auc_":[0.8]}}"#)],
    ])
    .await;
    let model = fake.engine.model(params()).with_name("base");
    let search = HyperoptSearch::new(SearchKind::Random, model, None)
        .unwrap()
        .with_session_name("search-1");

    let models = search.get_models().await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name(), "search-1-0");
    assert_eq!(models[0].params().max_depth, 7);

    let scores = search.get_scores().await.unwrap();
    assert_eq!(scores["search-1-0"]["auc_"], json!([0.8]));

    let received = fake.received().await;
    assert_eq!(
        received[0][0].json(),
        json!({"type_": "RelboostModel.get_hyperopt_names", "name_": "search-1"})
    );
    assert_eq!(received[1][0].json()["name_"], json!("search-1-0"));
    assert_eq!(
        received[2][0].json(),
        json!({"type_": "RelboostModel.get_hyperopt_scores", "name_": "search-1"})
    );
}
