//! End-to-end tests for the report, commit message, and change summary
//! workflows over real repositories and a mocked AI backend.

mod common;

use common::{TestRepo, days_query, local};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workscribe::report::{
    ChangeSpan, GenerationMode, commit_message_from_diff, produce_change_summary_with,
    produce_report, produce_report_with,
};
use workscribe::vcs::GitProvider;
use workscribe::{
    AiClient, AiProvider, DiffScope, Language, ReportError, Settings, VcsKind, VcsSelector,
};

fn english() -> Settings {
    Settings {
        language: Language::English,
        ..Settings::default()
    }
}

async fn mock_chat(server: &MockServer, expect_in_prompt: &str, answer: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(expect_in_prompt))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": answer } }]
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn three_commit_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit_as("Alice Smith", local(2024, 1, 1, 9, 0), "feat: parser", &[("parser.rs", "a")]);
    repo.commit_as("Bob", local(2024, 1, 1, 14, 0), "fix: lexer", &[("lexer.rs", "b")]);
    repo.commit_as("Alice Smith", local(2024, 1, 2, 11, 0), "docs: guide", &[("guide.md", "c")]);
    repo
}

// =============================================================================
// PERIOD REPORTS
// =============================================================================

#[tokio::test]
async fn test_fallback_report_without_api_key() {
    let repo = three_commit_repo();

    let report = produce_report(
        &english(),
        repo.path(),
        days_query((2024, 1, 1), (2024, 1, 2)),
        GenerationMode::Auto,
    )
    .await
    .expect("Fallback report failed");

    assert!(!report.used_ai);
    assert_eq!(report.commit_count, 3);
    assert_eq!(report.file_stem, "report_2024-01-01_2024-01-02");
    assert!(report.content.contains("> Commits: 3\n"));

    let day_two = report.content.find("## 2024-01-02").unwrap();
    let day_one = report.content.find("## 2024-01-01").unwrap();
    assert!(day_two < day_one, "Newest day comes first");
    assert_eq!(report.content[day_two..day_one].matches("- **").count(), 1);
    assert_eq!(report.content[day_one..].matches("- **").count(), 2);
}

#[tokio::test]
async fn test_fallback_mode_ignores_api_key() {
    let repo = three_commit_repo();
    let settings = Settings {
        api_key: "sk-unused".to_string(),
        ..english()
    };

    let report = produce_report(
        &settings,
        repo.path(),
        days_query((2024, 1, 1), (2024, 1, 2)),
        GenerationMode::Fallback,
    )
    .await
    .unwrap();

    assert!(!report.used_ai);
}

#[tokio::test]
async fn test_ai_report_with_author_filter() {
    let repo = three_commit_repo();
    let server = MockServer::start().await;
    mock_chat(&server, "feat: parser", "### Overview\nParser and guide work.").await;

    let settings = Settings {
        api_key: "sk-test".to_string(),
        author_filter: "alice".to_string(),
        ..english()
    };
    let client = AiClient::from_settings(&settings).with_base_url(server.uri());

    let report = produce_report_with(
        &settings,
        &GitProvider::new(),
        Some(&client),
        repo.path(),
        days_query((2024, 1, 1), (2024, 1, 2)),
    )
    .await
    .unwrap();

    assert!(report.used_ai);
    assert_eq!(report.commit_count, 2);
    assert!(report.content.contains("### Overview\nParser and guide work."));
    assert!(report.content.contains("| Alice Smith | feat: parser |"));
    assert!(!report.content.contains("fix: lexer"));
}

#[tokio::test]
async fn test_empty_period_is_no_commits() {
    let repo = three_commit_repo();

    let err = produce_report(
        &english(),
        repo.path(),
        days_query((2023, 6, 1), (2023, 6, 30)),
        GenerationMode::Auto,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::NoCommits));
    assert!(err.is_empty_result());
}

#[tokio::test]
async fn test_plain_directory_reports_no_provider() {
    let dir = tempfile::tempdir().unwrap();

    let err = produce_report(
        &english(),
        dir.path(),
        days_query((2024, 1, 1), (2024, 1, 2)),
        GenerationMode::Auto,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::NoProviderDetected(_)));
}

#[tokio::test]
async fn test_explicit_svn_on_git_repo_fails() {
    let repo = three_commit_repo();
    let settings = Settings {
        vcs: VcsSelector::Fixed(VcsKind::Svn),
        ..english()
    };

    let err = produce_report(
        &settings,
        repo.path(),
        days_query((2024, 1, 1), (2024, 1, 2)),
        GenerationMode::Auto,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::Vcs(_)));
}

// =============================================================================
// COMMIT MESSAGE
// =============================================================================

#[tokio::test]
async fn test_commit_message_from_staged_diff() {
    let repo = TestRepo::new();
    repo.commit_as("Test User", local(2024, 1, 1, 9, 0), "initial", &[("lib.rs", "fn a() {}\n")]);
    repo.write("lib.rs", "fn a() {}\nfn b() {}\n");
    repo.stage("lib.rs");

    let server = MockServer::start().await;
    mock_chat(&server, "+fn b() {}", "feature: add b helper").await;
    let client = AiClient::new(AiProvider::DeepSeek, "sk-test", None).with_base_url(server.uri());

    let diff = GitProvider::new()
        .working_diff(repo.path(), DiffScope::Staged)
        .unwrap();
    let message = commit_message_from_diff(&diff, Language::English, &client)
        .await
        .unwrap();

    assert_eq!(message, "feature: add b helper");
}

// =============================================================================
// CHANGE SUMMARY
// =============================================================================

#[tokio::test]
async fn test_change_summary_recent_commits() {
    let repo = TestRepo::new();
    repo.commit_as("Test User", local(2024, 1, 1, 9, 0), "one", &[("one.txt", "1\n")]);
    repo.commit_as("Test User", local(2024, 1, 2, 9, 0), "two", &[("two.txt", "2\n")]);
    repo.commit_as("Test User", local(2024, 1, 3, 9, 0), "three", &[("three.txt", "3\n")]);

    let server = MockServer::start().await;
    mock_chat(&server, "three.txt", "### Overview\nTwo files added.").await;
    let client = AiClient::new(AiProvider::OpenAi, "sk-test", None).with_base_url(server.uri());

    let generated_at = local(2024, 1, 3, 18, 0);
    let summary = produce_change_summary_with(
        &english(),
        repo.path(),
        ChangeSpan::Recent(2),
        &client,
        generated_at,
    )
    .await
    .unwrap();

    assert_eq!(summary.file_stem, "change_summary_20240103_180000");
    assert!(summary.content.starts_with("# Code Change Summary\n"));
    assert!(summary.content.ends_with("### Overview\nTwo files added."));

    let listing = GitProvider::new().recent_commits(repo.path(), 2).unwrap();
    let expected_range = format!("> Range: {} → {}", listing[1].id, listing[0].id);
    assert!(summary.content.contains(&expected_range));
}

#[tokio::test]
async fn test_change_summary_between_orders_older_first() {
    let repo = TestRepo::new();
    repo.commit_as("Test User", local(2024, 1, 1, 9, 0), "one", &[("f.txt", "a\n")]);
    repo.commit_as("Test User", local(2024, 1, 2, 9, 0), "two", &[("f.txt", "b\n")]);
    repo.commit_as("Test User", local(2024, 1, 3, 9, 0), "three", &[("f.txt", "c\n")]);
    let listing = GitProvider::new().recent_commits(repo.path(), 3).unwrap();
    let (newest, oldest) = (listing[0].id.clone(), listing[2].id.clone());

    let server = MockServer::start().await;
    mock_chat(&server, "+c", "### Overview\nRewrote f.").await;
    let client = AiClient::new(AiProvider::OpenAi, "sk-test", None).with_base_url(server.uri());

    // Newest given first; the range is still resolved oldest to newest
    let summary = produce_change_summary_with(
        &english(),
        repo.path(),
        ChangeSpan::Between {
            from: newest.clone(),
            to: oldest.clone(),
        },
        &client,
        local(2024, 1, 3, 18, 0),
    )
    .await
    .unwrap();

    assert!(summary.content.contains(&format!("> Range: {} → {}", oldest, newest)));
}

#[tokio::test]
async fn test_change_summary_identical_endpoints_has_no_changes() {
    let repo = TestRepo::new();
    repo.commit_at(local(2024, 1, 1, 9, 0), "only");
    let id = GitProvider::new().recent_commits(repo.path(), 1).unwrap()[0].id.clone();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = AiClient::new(AiProvider::OpenAi, "sk-test", None).with_base_url(server.uri());

    let err = produce_change_summary_with(
        &english(),
        repo.path(),
        ChangeSpan::Between { from: id.clone(), to: id },
        &client,
        local(2024, 1, 1, 18, 0),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::NoChanges));
}
