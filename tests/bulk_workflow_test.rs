use clap::Parser;
use sfbulk::cli::{execute, Cli};
use sfbulk::AppError;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JOBS_PATH: &str = "/services/data/v60.0/tooling/jobs/query";
const JOB_ID: &str = "750R0000000H8AAU";

fn cli(server: &MockServer, args: &[&str]) -> Cli {
    let mut argv = vec![
        "sfbulk".to_string(),
        "--json".to_string(),
        "--instance-url".to_string(),
        server.uri(),
        "--access-token".to_string(),
        "00Dxx!token".to_string(),
        "--api-version".to_string(),
        "v60.0".to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    Cli::try_parse_from(argv).expect("arguments should parse")
}

#[tokio::test]
async fn submit_report_and_download_as_json() {
    let server = MockServer::start().await;
    let query = "SELECT MetadataComponentName, RefMetadataComponentName FROM MetadataComponentDependency";

    Mock::given(method("POST"))
        .and(path(JOBS_PATH))
        .and(header("Authorization", "Bearer 00Dxx!token"))
        .and(body_json(serde_json::json!({ "operation": "query", "query": query })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": JOB_ID, "state": "UploadComplete" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/{}", JOBS_PATH, JOB_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": JOB_ID, "state": "JobComplete" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/{}/results", JOBS_PATH, JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "\"MetadataComponentName\",\"RefMetadataComponentName\"\n\"MyPage\",\"MyController\"\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    execute(&cli(&server, &["bulk", "query", "--query", query]))
        .await
        .unwrap();
    execute(&cli(&server, &["bulk", "report", "--jobid", JOB_ID]))
        .await
        .unwrap();

    let temp_dir = TempDir::new().unwrap();
    let retrieve_dir = temp_dir.path().join("bulkresults");
    execute(&cli(
        &server,
        &[
            "bulk",
            "result",
            "--jobid",
            JOB_ID,
            "--fileformat",
            "json",
            "--retrievedirectory",
            retrieve_dir.to_str().unwrap(),
        ],
    ))
    .await
    .unwrap();

    let written = std::fs::read_to_string(retrieve_dir.join("metadatadependency.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([
            { "MetadataComponentName": "MyPage", "RefMetadataComponentName": "MyController" }
        ])
    );
}

#[tokio::test]
async fn repeated_downloads_overwrite_the_same_file() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_str().unwrap().to_string();

    Mock::given(method("GET"))
        .and(path(format!("{}/{}/results", JOBS_PATH, JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_string("Id\nfirst\n"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let args = [
        "bulk",
        "result",
        "-i",
        JOB_ID,
        "-r",
        dir.as_str(),
        "-n",
        "deps",
    ];
    execute(&cli(&server, &args)).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("deps.csv")).unwrap(),
        "Id\nfirst\n"
    );

    Mock::given(method("GET"))
        .and(path(format!("{}/{}/results", JOBS_PATH, JOB_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_string("Id\nsecond\n"))
        .mount(&server)
        .await;

    execute(&cli(&server, &args)).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("deps.csv")).unwrap(),
        "Id\nsecond\n"
    );
}

#[tokio::test]
async fn server_error_is_returned_with_status_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/{}", JOBS_PATH, JOB_ID)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = execute(&cli(&server, &["bulk", "report", "-i", JOB_ID]))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Internal Server Error.The status code of response is 500"
    );
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn missing_instance_url_fails_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let parsed = Cli::try_parse_from([
        "sfbulk",
        "--json",
        "--instance-url",
        "",
        "--access-token",
        "tok",
        "bulk",
        "report",
        "-i",
        JOB_ID,
    ])
    .unwrap();

    let err = execute(&parsed).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidConfig(_)));
    assert_eq!(err.exit_code(), 78);
}
