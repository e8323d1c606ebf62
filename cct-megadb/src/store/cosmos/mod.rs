//! A synchronous client for a Cosmos DB (SQL API) container.

mod auth;

pub use auth::*;

use super::*;
use crate::{common::*, config::CosmosConfig, dataset::ImageRecord};
use chrono::Utc;

const API_VERSION: &str = "2018-12-31";

/// Inserts and queries documents through the REST API.
#[derive(Debug, Clone)]
pub struct CosmosStore {
    agent: ureq::Agent,
    key: MasterKey,
    endpoint: String,
    collection_link: String,
    page_size: usize,
}

/// Documents of one result page and the continuation token of the next.
pub type Page = (Vec<ImageRecord>, Option<String>);

/// The body of a query response page.
#[derive(Debug, Clone, Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents")]
    documents: Vec<ImageRecord>,
}

impl CosmosStore {
    pub fn new(config: &CosmosConfig) -> Result<Self> {
        let CosmosConfig {
            ref endpoint,
            ref master_key,
            ref database,
            ref container,
            page_size,
            timeout_secs,
        } = *config;

        ensure!(page_size > 0, "page_size must be positive");
        let master_key = master_key
            .as_deref()
            .ok_or_else(|| format_err!("master_key is not set"))?;
        let key = MasterKey::from_base64(master_key)?;

        let endpoint = endpoint.trim_end_matches('/').to_owned();
        ensure!(
            endpoint.starts_with("https://") || endpoint.starts_with("http://"),
            "invalid endpoint '{}'",
            endpoint
        );

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();

        Ok(Self {
            agent,
            key,
            endpoint,
            collection_link: format!("dbs/{}/colls/{}", database, container),
            page_size,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Iterate over the result pages of a query, following continuation tokens.
    pub fn query_pages<'a>(
        &'a self,
        query: &Query,
    ) -> QueryPages<impl FnMut(Option<&str>) -> Result<Page> + 'a> {
        let spec = query.to_sql();
        QueryPages::new(move |continuation| self.fetch_page(&spec, continuation))
    }

    fn docs_url(&self) -> String {
        format!("{}/{}/docs", self.endpoint, self.collection_link)
    }

    /// Common headers of a request on the document feed.
    fn signed_headers(&self, verb: &str) -> Result<Vec<(&'static str, String)>> {
        let date = http_date(Utc::now());
        let authorization = self
            .key
            .authorization(verb, "docs", &self.collection_link, &date)?;

        Ok(vec![
            ("Authorization", authorization),
            ("x-ms-date", date),
            ("x-ms-version", API_VERSION.to_owned()),
        ])
    }

    fn fetch_page(&self, spec: &SqlQuerySpec, continuation: Option<&str>) -> Result<Page> {
        let mut request = self.agent.post(&self.docs_url());
        for (name, value) in query_headers(self.page_size, continuation)
            .into_iter()
            .chain(self.signed_headers("POST")?)
        {
            request = request.set(name, &value);
        }

        let body = serde_json::to_string(spec)?;
        let response = send(request, &body)?;
        let status = response.status();
        let next = response.header("x-ms-continuation").map(ToOwned::to_owned);
        let text = response.into_string()?;

        read_page(status, next.as_deref(), &text)
            .with_context(|| format!("query '{}' failed", spec.query))
    }
}

impl DocumentStore for CosmosStore {
    fn insert(&mut self, record: &ImageRecord) -> Result<()> {
        let mut request = self.agent.post(&self.docs_url());
        for (name, value) in
            insert_headers(record)?.into_iter().chain(self.signed_headers("POST")?)
        {
            request = request.set(name, &value);
        }

        let body = serde_json::to_string(record)?;
        let response = send(request, &body)?;
        let status = response.status();
        check_status(status, &response.into_string()?)?;
        debug!("inserted document '{}'", record.id);
        Ok(())
    }

    fn query(&self, query: &Query) -> Result<Vec<ImageRecord>> {
        let mut num_pages = 0;
        let mut records = vec![];

        for page in self.query_pages(query) {
            records.extend(page?);
            num_pages += 1;
        }

        debug!(
            "{}: {} records in {} pages",
            query,
            records.len(),
            num_pages
        );
        Ok(records)
    }
}

/// Lazily fetched query result pages.
///
/// `fetch` receives the continuation token of the previous page, or `None`
/// for the first one. Iteration ends after a page without a token or after
/// the first error.
pub struct QueryPages<F> {
    fetch: F,
    continuation: Option<String>,
    done: bool,
}

impl<F> QueryPages<F>
where
    F: FnMut(Option<&str>) -> Result<Page>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            continuation: None,
            done: false,
        }
    }
}

impl<F> Iterator for QueryPages<F>
where
    F: FnMut(Option<&str>) -> Result<Page>,
{
    type Item = Result<Vec<ImageRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = (self.fetch)(self.continuation.as_deref());
        match result {
            Ok((documents, continuation)) => {
                self.done = continuation.is_none();
                self.continuation = continuation;
                Some(Ok(documents))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn insert_headers(record: &ImageRecord) -> Result<Vec<(&'static str, String)>> {
    let partition = record
        .dataset
        .as_deref()
        .ok_or_else(|| format_err!("record '{}' has no dataset partition", record.id))?;

    Ok(vec![
        ("Content-Type", "application/json".to_owned()),
        (
            "x-ms-documentdb-partitionkey",
            serde_json::to_string(&[partition])?,
        ),
    ])
}

fn query_headers(page_size: usize, continuation: Option<&str>) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("Content-Type", "application/query+json".to_owned()),
        ("x-ms-documentdb-isquery", "True".to_owned()),
        ("x-ms-documentdb-query-enablecrosspartition", "True".to_owned()),
        ("x-ms-max-item-count", page_size.to_string()),
    ];
    if let Some(token) = continuation {
        headers.push(("x-ms-continuation", token.to_owned()));
    }
    headers
}

/// Send a request, keeping error responses for [`check_status`].
fn send(request: ureq::Request, body: &str) -> Result<ureq::Response> {
    match request.send_string(body) {
        Ok(response) | Err(ureq::Error::Status(_, response)) => Ok(response),
        Err(err) => Err(err.into()),
    }
}

fn check_status(status: u16, body: &str) -> Result<()> {
    ensure!(
        (200..300).contains(&status),
        "the service responded with status {}: {}",
        status,
        body
    );
    Ok(())
}

/// Decode a query response. An empty continuation token ends the query.
fn read_page(status: u16, continuation: Option<&str>, body: &str) -> Result<Page> {
    check_status(status, body)?;
    let page: QueryPage = serde_json::from_str(body)?;
    let next = continuation
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned);
    Ok((page.documents, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CosmosConfig {
        CosmosConfig {
            endpoint: "https://example.documents.azure.com:443/".into(),
            master_key: Some("Y2FtZXJhLXRyYXAtdGVzdC1rZXk=".into()),
            database: "camera-trap".into(),
            container: "images".into(),
            page_size: 25,
            timeout_secs: 30,
        }
    }

    #[test]
    fn build_store() -> Result<()> {
        let store = CosmosStore::new(&config())?;
        assert_eq!(
            store.docs_url(),
            "https://example.documents.azure.com:443/dbs/camera-trap/colls/images/docs"
        );
        assert_eq!(store.page_size(), 25);

        let headers = store.signed_headers("POST")?;
        let names: Vec<_> = headers.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["Authorization", "x-ms-date", "x-ms-version"]);
        assert!(headers[0].1.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        Ok(())
    }

    #[test]
    fn reject_incomplete_config() {
        let mut no_key = config();
        no_key.master_key = None;
        assert!(CosmosStore::new(&no_key).is_err());

        let mut bad_endpoint = config();
        bad_endpoint.endpoint = "example.documents.azure.com".into();
        assert!(CosmosStore::new(&bad_endpoint).is_err());

        let mut zero_page = config();
        zero_page.page_size = 0;
        assert!(CosmosStore::new(&zero_page).is_err());
    }

    #[test]
    fn partition_key_header() -> Result<()> {
        let mut record = ImageRecord::new("cam~im");
        assert!(insert_headers(&record).is_err());

        record.dataset = Some("idfg".into());
        let headers = insert_headers(&record)?;
        assert_eq!(
            headers[1],
            ("x-ms-documentdb-partitionkey", r#"["idfg"]"#.to_owned())
        );
        Ok(())
    }

    fn page_body(ids: &[&str]) -> String {
        let documents: Vec<_> = ids.iter().map(|&id| ImageRecord::new(id)).collect();
        serde_json::json!({ "Documents": documents, "_count": ids.len() }).to_string()
    }

    #[test]
    fn follow_continuation_tokens() -> Result<()> {
        let responses = vec![
            (page_body(&["a", "b"]), Some("t1")),
            (page_body(&["c"]), Some("t2")),
            (page_body(&["d", "e"]), None),
        ];
        let mut responses = responses.into_iter();
        let mut tokens = vec![];

        let pages: Vec<_> = QueryPages::new(|continuation: Option<&str>| {
            tokens.push(continuation.map(ToOwned::to_owned));
            let (body, next) = responses.next().expect("no more pages");
            read_page(200, next, &body)
        })
        .collect::<Result<_>>()?;

        let ids: Vec<_> = pages
            .iter()
            .map(|page| page.iter().map(|record| record.id.as_str()).collect::<Vec<_>>())
            .collect();
        assert_eq!(ids, vec![vec!["a", "b"], vec!["c"], vec!["d", "e"]]);
        assert_eq!(
            tokens,
            vec![None, Some("t1".to_owned()), Some("t2".to_owned())]
        );
        Ok(())
    }

    #[test]
    fn stop_on_empty_continuation() -> Result<()> {
        let mut calls = 0;
        let pages: Vec<_> = QueryPages::new(|_: Option<&str>| {
            calls += 1;
            read_page(200, Some(""), &page_body(&["a"]))
        })
        .collect::<Result<_>>()?;

        assert_eq!(pages.len(), 1);
        assert_eq!(calls, 1);
        Ok(())
    }

    #[test]
    fn propagate_error_status() {
        let mut calls = 0;
        let mut pages = QueryPages::new(|_: Option<&str>| {
            calls += 1;
            read_page(500, Some("t1"), r#"{"code":"InternalServerError"}"#)
        });

        let err = pages.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("status 500"));
        assert!(err.to_string().contains("InternalServerError"));
        assert!(pages.next().is_none());
        drop(pages);
        assert_eq!(calls, 1);

        let err = check_status(409, "Entity with the specified id already exists").unwrap_err();
        assert!(err.to_string().contains("status 409"));
        assert!(check_status(201, "").is_ok());
    }

    #[test]
    fn cross_partition_query_headers() {
        let headers = query_headers(100, Some("token"));
        assert!(headers.contains(&("x-ms-documentdb-query-enablecrosspartition", "True".into())));
        assert!(headers.contains(&("x-ms-max-item-count", "100".into())));
        assert!(headers.contains(&("x-ms-continuation", "token".into())));

        let headers = query_headers(100, None);
        assert!(headers.iter().all(|(name, _)| *name != "x-ms-continuation"));
    }
}
