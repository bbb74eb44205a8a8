//! Templates for the editable request draft and the CI result comment.
//!
//! Both are rendered with `minijinja`. The draft template produces the
//! scratch text handed to the operator's editor: an instructional header
//! (removed again by [`crate::directives::strip`]), the commit messages, a
//! notify line, and the directive block with commented-out reviewer lines
//! for every eligible member.

use minijinja::Environment;
use serde::Serialize;

use crate::backend::Member;
use crate::error::GitPrError;

const REQUEST_TEMPLATE: &str = "\
#
# Edit the request title and description, then save and exit.
#
# Lines starting with '#' are removed. The first remaining line is the
# title and the rest is the description. A title starting with '!' aborts.
# Comment or uncomment the directives at the end to control extra actions.
#
# User: {{ user }}
# Branch: {{ branch }}
# Upstream: {{ upstream }}
# Owner/Repo: {{ owner }}/{{ repo }}
# Remove: {{ remove_source_branch }}
#
{{ commits }}

{% if team %}
Notify @{{ team }}

{% endif %}
####### directives ##########
{% if label_key %}
{{ label_key }}: {{ label }}
{% endif %}
{% if remove_key %}
{{ remove_key }}: {{ remove_source_branch }}
{% endif %}
# This request will trigger the following test suite
Jenkins-Suite: {{ suite }}

# Uncomment to add members as reviewers
{% for member in members %}
#Review-By: {{ member.handle }} <{{ member.name }}>
{% endfor %}
";

const COMMENT_TEMPLATE: &str = "\
\"{{ suite }}\" test suite results -

{{ url }}

---
Brought to you by git-pr
";

/// Values substituted into the draft template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DraftTemplateContext {
    /// Operator handle.
    pub user: String,
    /// Remote source branch.
    pub branch: String,
    /// Target branch.
    pub upstream: String,
    /// Repository owner path.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Default for removing the source branch after merge.
    pub remove_source_branch: bool,
    /// Team mentioned on the notify line; empty hides the line.
    pub team: String,
    /// Default label value.
    pub label: String,
    /// Backend label directive key; empty hides the line.
    pub label_key: String,
    /// Backend remove-branch directive key; empty hides the line.
    pub remove_key: String,
    /// Default CI suite.
    pub suite: String,
    /// Commit messages between the upstream and `HEAD`.
    pub commits: String,
    /// Members offered as reviewers.
    pub members: Vec<TemplateMember>,
}

/// A roster entry as exposed to the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateMember {
    /// Login handle.
    pub handle: String,
    /// Display name.
    pub name: String,
}

impl From<&Member> for TemplateMember {
    fn from(member: &Member) -> Self {
        Self {
            handle: member.handle.clone(),
            name: member.display_name.clone(),
        }
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
    env
}

fn render<S: Serialize>(
    name: &'static str,
    source: &'static str,
    context: &S,
) -> Result<String, GitPrError> {
    let mut env = environment();
    env.add_template(name, source)?;
    Ok(env.get_template(name)?.render(context)?)
}

/// Renders the editable draft.
///
/// # Errors
///
/// Returns [`GitPrError::Template`] when rendering fails.
pub fn render_request_draft(context: &DraftTemplateContext) -> Result<String, GitPrError> {
    render("request", REQUEST_TEMPLATE, context)
}

/// Renders the comment posted after a CI build starts.
///
/// # Errors
///
/// Returns [`GitPrError::Template`] when rendering fails.
pub fn render_ci_comment(suite: &str, url: &str) -> Result<String, GitPrError> {
    #[derive(Serialize)]
    struct CommentContext<'a> {
        suite: &'a str,
        url: &'a str,
    }

    render("comment", COMMENT_TEMPLATE, &CommentContext { suite, url })
}

/// Renders the remote branch name from a user-supplied template such as
/// `{{ user }}/{{ branch }}`.
///
/// # Errors
///
/// Returns [`GitPrError::Template`] when the template is invalid.
pub fn render_branch_name(
    template: &str,
    branch: &str,
    user: &str,
    owner: &str,
    repo: &str,
) -> Result<String, GitPrError> {
    let rendered = environment().render_str(
        template,
        minijinja::context! { branch => branch, user => user, owner => owner, repo => repo },
    )?;
    Ok(rendered.trim().to_owned())
}
