use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::jobs::JobError;
use harvest_core::domain::{AggregateDocument, Discussion, DiscussionFilter, render_discussion};
use harvest_core::pagination::Paginator;
use harvest_core::types::{RepoId, Since};
use harvest_infra::github::GithubClient;
use harvest_infra::output::RunDir;

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub since: Option<Since>,
    pub only_contributors: bool,
    pub write_documents: bool,
    pub write_aggregate: bool,
    pub page_size: u32,
}

impl HarvestOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            since: config.since,
            only_contributors: config.only_contributors,
            write_documents: config.write_documents,
            write_aggregate: config.write_aggregate,
            page_size: config.page_size,
        }
    }
}

#[derive(Debug, Default)]
pub struct HarvestStats {
    pub pages: usize,
    pub seen: usize,
    pub duplicates: usize,
    pub skipped_since: usize,
    pub skipped_contributors: usize,
    pub written: usize,
    pub errors: usize,
}

/// Lists, filters and stores every matching discussion of `repo` into `run_dir`.
///
/// Listing failures, contributor lookup failures and bad credentials abort the
/// run. Anything else that goes wrong for a single discussion is logged and
/// counted in [`HarvestStats::errors`].
pub async fn run(
    client: &GithubClient,
    repo: &RepoId,
    options: &HarvestOptions,
    run_dir: &RunDir,
) -> Result<HarvestStats, JobError> {
    let contributors = if options.only_contributors {
        let contributors = client.fetch_contributors(repo).await?;
        if contributors.is_empty() {
            warn!(%repo, "no commit authors found, every discussion will be skipped");
        } else {
            info!(%repo, contributors = contributors.len(), "contributor set loaded");
        }
        Some(contributors)
    } else {
        None
    };
    let filter = DiscussionFilter::new(options.since, contributors);
    if let Some(since) = filter.since() {
        info!(threshold = %since.threshold(), "filtering by last update");
    }

    let mut stats = HarvestStats::default();
    let mut processed = HashSet::new();
    let mut aggregate = AggregateDocument::default();
    let mut paginator =
        Paginator::new(client.discussion_listing(repo, filter.since(), options.page_size));

    loop {
        let page = match paginator.next_page().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(err) => {
                error!(cursor = ?paginator.cursor(), error = %err, "discussion listing failed");
                return Err(err.into());
            }
        };
        stats.pages += 1;
        debug!(page = stats.pages, items = page.len(), "listing page received");
        for entry in page {
            stats.seen += 1;
            let summary = match entry {
                Ok(summary) => summary,
                Err(malformed) => {
                    stats.errors += 1;
                    warn!(
                        number = malformed.number,
                        error = %malformed.error,
                        "malformed listing entry skipped"
                    );
                    continue;
                }
            };
            let number = summary.number;
            if !processed.insert(number) {
                stats.duplicates += 1;
                debug!(number, "already processed in this run");
                continue;
            }
            if !filter.updated_since(summary.updated_at) {
                stats.skipped_since += 1;
                debug!(number, updated_at = %summary.updated_at, "not updated since threshold");
                continue;
            }

            let discussion = match client.fetch_discussion(repo, number).await {
                Ok(discussion) => discussion,
                Err(err) if err.is_auth() => {
                    error!(number, error = %err, "authentication failed");
                    return Err(err.into());
                }
                Err(err) => {
                    stats.errors += 1;
                    error!(number, error = %err, "discussion fetch failed");
                    continue;
                }
            };
            if !filter.accepts(&discussion) {
                if filter.updated_since(discussion.updated_at) {
                    stats.skipped_contributors += 1;
                    debug!(number, "no contributor participated");
                } else {
                    stats.skipped_since += 1;
                    debug!(
                        number,
                        updated_at = %discussion.updated_at,
                        "detail not updated since threshold"
                    );
                }
                continue;
            }

            store(&discussion, options, run_dir, &mut aggregate, &mut stats);
        }
    }

    if options.write_aggregate && !aggregate.is_empty() {
        let documents = aggregate.len();
        let path = run_dir.write_aggregate(&aggregate.render())?;
        info!(documents, path = %path.display(), "aggregate document written");
    }

    info!(
        pages = stats.pages,
        seen = stats.seen,
        duplicates = stats.duplicates,
        skipped_since = stats.skipped_since,
        skipped_contributors = stats.skipped_contributors,
        written = stats.written,
        errors = stats.errors,
        "harvest complete"
    );
    Ok(stats)
}

fn store(
    discussion: &Discussion,
    options: &HarvestOptions,
    run_dir: &RunDir,
    aggregate: &mut AggregateDocument,
    stats: &mut HarvestStats,
) {
    let number = discussion.number;
    match run_dir.write_raw(discussion) {
        Ok(path) => {
            stats.written += 1;
            info!(
                number,
                comments = discussion.comments.len(),
                replies = discussion.reply_count(),
                path = %path.display(),
                "discussion saved"
            );
        }
        Err(err) => {
            stats.errors += 1;
            error!(number, error = %err, "raw record write failed");
            return;
        }
    }
    if !options.write_documents {
        return;
    }

    let document = render_discussion(discussion);
    if let Err(err) = run_dir.write_document(number, &document) {
        stats.errors += 1;
        error!(number, error = %err, "document write failed");
    }
    if options.write_aggregate {
        aggregate.push(discussion.created_at, document);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::{Value, json};
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use harvest_core::domain::document::DOCUMENT_SEPARATOR;
    use harvest_infra::github::RetryPolicy;

    fn repo() -> RepoId {
        RepoId::try_from("octo/widgets").unwrap()
    }

    fn options() -> HarvestOptions {
        HarvestOptions {
            since: None,
            only_contributors: false,
            write_documents: true,
            write_aggregate: true,
            page_size: 30,
        }
    }

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(reqwest::Client::new(), "test-token".to_string())
            .with_endpoint(format!("{}/graphql", server.uri()))
            .with_retry(RetryPolicy::immediate(0))
    }

    fn run_dir(parent: &tempfile::TempDir) -> RunDir {
        let started_at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        RunDir::create(parent.path(), started_at).unwrap()
    }

    fn summary_json(number: i32, created_at: &str, updated_at: &str) -> Value {
        json!({
            "id": format!("D_{number}"),
            "number": number,
            "title": format!("Discussion {number}"),
            "url": format!("https://github.com/octo/widgets/discussions/{number}"),
            "createdAt": created_at,
            "updatedAt": updated_at,
            "author": { "login": "alice" }
        })
    }

    fn search_json(nodes: Vec<Value>, cursor: Option<&str>) -> Value {
        json!({ "data": { "search": {
            "discussionCount": nodes.len(),
            "pageInfo": { "endCursor": cursor, "hasNextPage": cursor.is_some() },
            "nodes": nodes
        }}})
    }

    fn comment_json(id: &str, login: &str, replies: Vec<Value>) -> Value {
        json!({
            "id": id,
            "bodyText": format!("comment {id}"),
            "createdAt": "2024-01-02T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
            "isMinimized": false,
            "minimizedReason": null,
            "author": { "login": login },
            "replies": {
                "pageInfo": { "endCursor": null, "hasNextPage": false },
                "nodes": replies
            }
        })
    }

    fn reply_json(id: &str, login: &str) -> Value {
        json!({
            "id": id,
            "bodyText": format!("reply {id}"),
            "createdAt": "2024-01-03T00:00:00Z",
            "updatedAt": "2024-01-03T00:00:00Z",
            "isMinimized": true,
            "minimizedReason": "OUTDATED",
            "author": { "login": login }
        })
    }

    fn detail_json(summary: Value, body: &str, comments: Vec<Value>) -> Value {
        let mut discussion = summary;
        discussion["bodyText"] = json!(body);
        discussion["locked"] = json!(false);
        discussion["category"] = json!({ "name": "General" });
        discussion["answer"] = Value::Null;
        discussion["labels"] = json!({ "nodes": [] });
        discussion["comments"] = json!({
            "pageInfo": { "endCursor": null, "hasNextPage": false },
            "nodes": comments
        });
        json!({ "data": { "repository": { "discussion": discussion } } })
    }

    async fn mount_listing(server: &MockServer, nodes: Vec<Value>) {
        Mock::given(method("POST"))
            .and(body_string_contains("SearchDiscussions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_json(nodes, None)))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_detail(
        server: &MockServer,
        number: i32,
        response: ResponseTemplate,
        calls: u64,
    ) {
        Mock::given(method("POST"))
            .and(body_string_contains("query DiscussionDetail"))
            .and(body_string_contains(format!(r#""number":{number},"#)))
            .respond_with(response)
            .expect(calls)
            .mount(server)
            .await;
    }

    async fn mount_contributors(server: &MockServer, logins: &[&str]) {
        let nodes: Vec<Value> = logins
            .iter()
            .map(|login| json!({ "author": { "user": { "login": login } } }))
            .collect();
        Mock::given(method("POST"))
            .and(body_string_contains("CommitAuthors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "repository": { "defaultBranchRef": { "target": { "history": {
                    "pageInfo": { "endCursor": null, "hasNextPage": false },
                    "nodes": nodes
                }}}}}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn ok(body: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(body)
    }

    #[tokio::test]
    async fn writes_records_and_aggregate_in_creation_order() {
        let server = MockServer::start().await;
        let summaries = [
            summary_json(2, "2024-01-02T00:00:00Z", "2024-02-01T00:00:00Z"),
            summary_json(3, "2024-01-03T00:00:00Z", "2024-02-01T00:00:00Z"),
            summary_json(1, "2024-01-01T00:00:00Z", "2024-02-01T00:00:00Z"),
        ];
        mount_listing(&server, summaries.to_vec()).await;
        for summary in summaries {
            let number = summary["number"].as_i64().unwrap() as i32;
            let comments = vec![comment_json(
                &format!("DC_{number}"),
                "bob",
                vec![reply_json(&format!("DR_{number}"), "carol")],
            )];
            mount_detail(&server, number, ok(detail_json(summary, "Body text", comments)), 1).await;
        }

        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options(), &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.pages, 1);
        assert_eq!(stats.seen, 3);
        assert_eq!(stats.written, 3);
        assert_eq!(stats.errors, 0);

        let documents: Vec<String> = [1, 2, 3]
            .into_iter()
            .map(|number| fs::read_to_string(run_dir.document_path(number)).unwrap())
            .collect();
        let aggregate = fs::read_to_string(run_dir.aggregate_path()).unwrap();
        assert_eq!(aggregate, documents.join(DOCUMENT_SEPARATOR));
        assert!(documents[0].contains(r#"<reply id="DR_1" author="carol""#));

        let raw: Discussion =
            serde_json::from_str(&fs::read_to_string(run_dir.raw_path(2)).unwrap()).unwrap();
        assert_eq!(raw.number, 2);
        assert_eq!(raw.comments.len(), 1);
        assert_eq!(raw.comments[0].replies[0].minimized_reason.as_deref(), Some("OUTDATED"));
    }

    #[tokio::test]
    async fn since_threshold_skips_stale_discussions_before_detail_fetch() {
        let server = MockServer::start().await;
        let fresh = summary_json(1, "2024-01-01T00:00:00Z", "2024-03-10T12:00:00Z");
        let stale = summary_json(2, "2024-01-01T00:00:00Z", "2024-03-10T06:00:00Z");
        mount_listing(&server, vec![fresh.clone(), stale.clone()]).await;
        mount_detail(&server, 1, ok(detail_json(fresh, "fresh", vec![])), 1).await;
        mount_detail(&server, 2, ok(detail_json(stale, "stale", vec![])), 0).await;

        let threshold = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let options = HarvestOptions {
            since: Some(Since::parse("1d", threshold + chrono::Duration::days(1)).unwrap()),
            ..options()
        };
        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options, &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.skipped_since, 1);
        assert_eq!(stats.written, 1);
        assert!(run_dir.raw_path(1).exists());
        assert!(!run_dir.raw_path(2).exists());
    }

    #[tokio::test]
    async fn contributor_filter_keeps_only_discussions_with_contributors() {
        let server = MockServer::start().await;
        mount_contributors(&server, &["bob"]).await;
        let commented = summary_json(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        let replied = summary_json(2, "2024-01-02T00:00:00Z", "2024-01-05T00:00:00Z");
        let outsiders = summary_json(3, "2024-01-03T00:00:00Z", "2024-01-05T00:00:00Z");
        mount_listing(&server, vec![commented.clone(), replied.clone(), outsiders.clone()]).await;
        mount_detail(
            &server,
            1,
            ok(detail_json(commented, "", vec![comment_json("DC_1", "bob", vec![])])),
            1,
        )
        .await;
        mount_detail(
            &server,
            2,
            ok(detail_json(
                replied,
                "",
                vec![comment_json("DC_2", "erin", vec![reply_json("DR_2", "bob")])],
            )),
            1,
        )
        .await;
        mount_detail(
            &server,
            3,
            ok(detail_json(outsiders, "", vec![comment_json("DC_3", "erin", vec![])])),
            1,
        )
        .await;

        let options = HarvestOptions {
            only_contributors: true,
            ..options()
        };
        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options, &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.written, 2);
        assert_eq!(stats.skipped_contributors, 1);
        assert!(run_dir.raw_path(1).exists());
        assert!(run_dir.raw_path(2).exists());
        assert!(!run_dir.raw_path(3).exists());
    }

    #[tokio::test]
    async fn empty_contributor_set_emits_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("CommitAuthors"))
            .respond_with(ok(json!({ "data": { "repository": { "defaultBranchRef": null } } })))
            .expect(1)
            .mount(&server)
            .await;
        let summary = summary_json(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        mount_listing(&server, vec![summary.clone()]).await;
        mount_detail(&server, 1, ok(detail_json(summary, "hi", vec![])), 1).await;

        let options = HarvestOptions {
            only_contributors: true,
            ..options()
        };
        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options, &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.written, 0);
        assert_eq!(stats.skipped_contributors, 1);
        assert!(!run_dir.aggregate_path().exists());
    }

    #[tokio::test]
    async fn contributor_lookup_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("CommitAuthors"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("SearchDiscussions"))
            .respond_with(ok(search_json(vec![], None)))
            .expect(0)
            .mount(&server)
            .await;

        let options = HarvestOptions {
            only_contributors: true,
            ..options()
        };
        let parent = tempfile::tempdir().unwrap();
        let err = run(&client(&server), &repo(), &options, &run_dir(&parent))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Github(_)));
    }

    #[tokio::test]
    async fn detail_failure_is_counted_and_run_continues() {
        let server = MockServer::start().await;
        let broken = summary_json(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        let fine = summary_json(2, "2024-01-02T00:00:00Z", "2024-01-05T00:00:00Z");
        mount_listing(&server, vec![broken, fine.clone()]).await;
        mount_detail(
            &server,
            1,
            ok(json!({ "errors": [{ "message": "Something went wrong" }] })),
            1,
        )
        .await;
        mount_detail(&server, 2, ok(detail_json(fine, "fine", vec![])), 1).await;

        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options(), &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.written, 1);
        assert!(!run_dir.raw_path(1).exists());
        assert!(run_dir.document_path(2).exists());
    }

    #[tokio::test]
    async fn unauthorized_detail_aborts_the_run() {
        let server = MockServer::start().await;
        let first = summary_json(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        let second = summary_json(2, "2024-01-02T00:00:00Z", "2024-01-05T00:00:00Z");
        mount_listing(&server, vec![first, second.clone()]).await;
        mount_detail(
            &server,
            1,
            ResponseTemplate::new(401).set_body_string("Bad credentials"),
            1,
        )
        .await;
        mount_detail(&server, 2, ok(detail_json(second, "", vec![])), 0).await;

        let parent = tempfile::tempdir().unwrap();
        let err = run(&client(&server), &repo(), &options(), &run_dir(&parent))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Github(ref inner) if inner.is_auth()));
    }

    #[tokio::test]
    async fn malformed_listing_entry_is_skipped_and_counted() {
        let server = MockServer::start().await;
        let good = summary_json(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        let bad = summary_json(2, "2024-01-02T00:00:00Z", "not-a-date");
        mount_listing(&server, vec![good.clone(), bad]).await;
        mount_detail(&server, 1, ok(detail_json(good, "good", vec![])), 1).await;
        mount_detail(&server, 2, ok(json!({})), 0).await;

        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options(), &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.seen, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.written, 1);
        assert!(run_dir.raw_path(1).exists());
        assert!(!run_dir.raw_path(2).exists());
    }

    #[tokio::test]
    async fn raw_write_failure_skips_documents_and_continues() {
        let server = MockServer::start().await;
        let blocked = summary_json(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        let fine = summary_json(2, "2024-01-02T00:00:00Z", "2024-01-05T00:00:00Z");
        mount_listing(&server, vec![blocked.clone(), fine.clone()]).await;
        mount_detail(&server, 1, ok(detail_json(blocked, "blocked", vec![])), 1).await;
        mount_detail(&server, 2, ok(detail_json(fine, "fine", vec![])), 1).await;

        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        fs::create_dir(run_dir.raw_path(1)).unwrap();
        let stats = run(&client(&server), &repo(), &options(), &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.written, 1);
        assert!(!run_dir.document_path(1).exists());
        assert!(run_dir.raw_path(2).is_file());
        let document = fs::read_to_string(run_dir.document_path(2)).unwrap();
        assert_eq!(fs::read_to_string(run_dir.aggregate_path()).unwrap(), document);
    }

    #[tokio::test]
    async fn stale_detail_behind_fresh_listing_is_skipped() {
        let server = MockServer::start().await;
        let summary = summary_json(1, "2024-01-01T00:00:00Z", "2024-03-10T12:00:00Z");
        let mut detail = detail_json(summary.clone(), "edited back", vec![]);
        detail["data"]["repository"]["discussion"]["updatedAt"] = json!("2024-03-01T00:00:00Z");
        mount_listing(&server, vec![summary]).await;
        mount_detail(&server, 1, ok(detail), 1).await;

        let options = HarvestOptions {
            since: Some(Since::from_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())),
            ..options()
        };
        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options, &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.skipped_since, 1);
        assert_eq!(stats.skipped_contributors, 0);
        assert_eq!(stats.written, 0);
        assert!(!run_dir.raw_path(1).exists());
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("SearchDiscussions"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let parent = tempfile::tempdir().unwrap();
        let err = run(&client(&server), &repo(), &options(), &run_dir(&parent))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Github(harvest_infra::github::GithubError::Status { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_numbers_are_processed_once() {
        let server = MockServer::start().await;
        let summary = summary_json(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        Mock::given(method("POST"))
            .and(body_string_contains("SearchDiscussions"))
            .and(body_string_contains(r#""after":null"#))
            .respond_with(ok(search_json(vec![summary.clone()], Some("p2"))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("SearchDiscussions"))
            .and(body_string_contains(r#""after":"p2""#))
            .respond_with(ok(search_json(vec![summary.clone()], None)))
            .expect(1)
            .mount(&server)
            .await;
        mount_detail(&server, 1, ok(detail_json(summary, "once", vec![])), 1).await;

        let parent = tempfile::tempdir().unwrap();
        let stats = run(&client(&server), &repo(), &options(), &run_dir(&parent))
            .await
            .unwrap();

        assert_eq!(stats.pages, 2);
        assert_eq!(stats.seen, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.written, 1);
    }

    #[tokio::test]
    async fn empty_discussion_still_produces_files() {
        let server = MockServer::start().await;
        let summary = summary_json(7, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        mount_listing(&server, vec![summary.clone()]).await;
        mount_detail(&server, 7, ok(detail_json(summary, "", vec![])), 1).await;

        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        run(&client(&server), &repo(), &options(), &run_dir)
            .await
            .unwrap();

        let document = fs::read_to_string(run_dir.document_path(7)).unwrap();
        assert!(document.contains("<body><![CDATA[]]></body>"));
        assert!(!document.contains("<comments"));
        assert_eq!(fs::read_to_string(run_dir.aggregate_path()).unwrap(), document);
    }

    #[tokio::test]
    async fn documents_can_be_disabled() {
        let server = MockServer::start().await;
        let summary = summary_json(4, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        mount_listing(&server, vec![summary.clone()]).await;
        mount_detail(&server, 4, ok(detail_json(summary, "raw only", vec![])), 1).await;

        let options = HarvestOptions {
            write_documents: false,
            write_aggregate: false,
            ..options()
        };
        let parent = tempfile::tempdir().unwrap();
        let run_dir = run_dir(&parent);
        let stats = run(&client(&server), &repo(), &options, &run_dir)
            .await
            .unwrap();

        assert_eq!(stats.written, 1);
        assert!(run_dir.raw_path(4).exists());
        assert!(!run_dir.document_path(4).exists());
        assert!(!run_dir.aggregate_path().exists());
    }
}
