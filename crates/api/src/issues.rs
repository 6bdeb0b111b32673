use std::fmt::Display;

use gitlab_issues_config::Config;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::error::Result;
use crate::models::Issue;
use crate::{read_by_id, ApiClient, AuthMode};

/// Issue operations over the `/api/<version>/[projects/<id>/]<resource>` routes.
#[derive(Clone)]
pub struct IssuesApi {
    client: ApiClient,
    api_version: String,
    resource: String,
}

impl IssuesApi {
    pub fn new(
        client: ApiClient,
        api_version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_version: api_version.into(),
            resource: resource.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ApiClient::from_config(config)?;
        Ok(Self::new(client, &config.api_version, &config.resource))
    }

    /// `GET /issues?<param>=<value>` with the private token.
    pub async fn list_all_issues(&self, param: &str, value: impl Display) -> Result<Vec<Issue>> {
        let value = value.to_string();
        self.list_issues(Some((param, value.as_str())), AuthMode::Authenticated)
            .await
    }

    /// `GET /issues` with the private token: issues visible to the token's user.
    pub async fn list_all_issues_to_user(&self) -> Result<Vec<Issue>> {
        self.list_issues(None, AuthMode::Authenticated).await
    }

    pub async fn list_issues(
        &self,
        filter: Option<(&str, &str)>,
        auth: AuthMode,
    ) -> Result<Vec<Issue>> {
        let mut url = self.global_url()?;
        if let Some((param, value)) = filter {
            url.query_pairs_mut().append_pair(param, value);
        }
        self.client.get(url, auth).await
    }

    /// Look an issue up by its global `id` among the user's issues.
    pub async fn read_by_issue_id(&self, id: u64) -> Result<Issue> {
        read_by_id(|| self.list_all_issues_to_user(), id).await
    }

    /// Single-resource read by project-scoped `iid`.
    pub async fn read_project_issue(&self, project_id: u64, issue_iid: u64) -> Result<Issue> {
        let url = self.issue_url(project_id, issue_iid)?;
        self.client.get(url, AuthMode::Authenticated).await
    }

    pub async fn list_all_issues_under_project(&self, project_id: u64) -> Result<Vec<Issue>> {
        let url = self.project_url(project_id)?;
        self.client.get(url, AuthMode::Authenticated).await
    }

    pub async fn add_new_issue_to_project(
        &self,
        project_id: u64,
        title: &str,
        label: &str,
        auth: AuthMode,
    ) -> Result<Issue> {
        let mut url = self.project_url(project_id)?;
        url.query_pairs_mut()
            .append_pair("title", title)
            .append_pair("labels", label);

        let issue: Issue = self.client.post(url, Option::<&()>::None, auth).await?;
        info!(
            id = issue.id,
            iid = issue.iid,
            project_id,
            state = %issue.state,
            "Issue created"
        );
        Ok(issue)
    }

    /// Returns the raw body; GitLab answers 204 with nothing, which comes back as `Value::Null`.
    pub async fn delete_issue_from_project(
        &self,
        project_id: u64,
        issue_iid: u64,
        auth: AuthMode,
    ) -> Result<Value> {
        let url = self.issue_url(project_id, issue_iid)?;
        let body: Value = self.client.delete(url, auth).await?;
        info!(iid = issue_iid, project_id, "Issue deleted");
        Ok(body)
    }

    /// `PUT` a single field, e.g. `state_event=close` or `confidential=true`.
    pub async fn update_an_issue(
        &self,
        param: &str,
        value: impl Display,
        issue_iid: u64,
        project_id: u64,
        auth: AuthMode,
    ) -> Result<Issue> {
        let mut url = self.issue_url(project_id, issue_iid)?;
        url.query_pairs_mut().append_pair(param, &value.to_string());
        self.client.put(url, Option::<&()>::None, auth).await
    }

    fn global_url(&self) -> Result<Url> {
        self.client
            .endpoint(["api", self.api_version.as_str(), self.resource.as_str()])
    }

    fn project_url(&self, project_id: u64) -> Result<Url> {
        let project_id = project_id.to_string();
        self.client.endpoint([
            "api",
            self.api_version.as_str(),
            "projects",
            project_id.as_str(),
            self.resource.as_str(),
        ])
    }

    fn issue_url(&self, project_id: u64, issue_iid: u64) -> Result<Url> {
        let project_id = project_id.to_string();
        let issue_iid = issue_iid.to_string();
        self.client.endpoint([
            "api",
            self.api_version.as_str(),
            "projects",
            project_id.as_str(),
            self.resource.as_str(),
            issue_iid.as_str(),
        ])
    }
}
