//! Link generation: source-line anchors and provider registry pages.

use std::path::Path;

const REGISTRY: &str = "https://registry.terraform.io/providers/hashicorp";

/// Render a Markdown link.
pub fn markdown_link(text: &str, href: &str) -> String {
    format!("[{}]({})", text.replace('[', "\\[").replace(']', "\\]"), href)
}

/// Root-relative anchor to a declaration, e.g. `/main.tf#L12`.
///
/// Path separators are always `/` so the link works on any forge.
pub fn source_href(source_file: &Path, line: usize) -> String {
    let path: Vec<_> = source_file
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    format!("/{}#L{}", path.join("/"), line)
}

/// Split a resource type at its first `_`: `aws_s3_bucket` → (`aws`, `s3_bucket`).
pub fn split_resource_type(resource_type: &str) -> Option<(&str, &str)> {
    resource_type
        .split_once('_')
        .filter(|(provider, name)| !provider.is_empty() && !name.is_empty())
}

/// Provider name of a resource type, the part before the first `_`.
pub fn provider_of(resource_type: &str) -> Option<&str> {
    split_resource_type(resource_type).map(|(provider, _)| provider)
}

/// Registry documentation page for a resource type.
pub fn registry_url(resource_type: &str) -> Option<String> {
    let (provider, name) = split_resource_type(resource_type)?;
    Some(format!(
        "{REGISTRY}/{provider}/latest/docs/resources/{name}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn source_anchor() {
        assert_eq!(source_href(Path::new("main.tf"), 12), "/main.tf#L12");
        let nested: PathBuf = ["sub", "vars.tf"].iter().collect();
        assert_eq!(source_href(&nested, 1), "/sub/vars.tf#L1");
    }

    #[test]
    fn registry_link() {
        assert_eq!(
            registry_url("aws_s3_bucket").as_deref(),
            Some("https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/s3_bucket")
        );
        assert_eq!(provider_of("google_compute_instance"), Some("google"));
    }

    #[test]
    fn type_without_provider_prefix() {
        assert_eq!(registry_url("null"), None);
        assert_eq!(provider_of("_odd"), None);
    }

    #[test]
    fn link_text_is_escaped() {
        assert_eq!(markdown_link("a[0]", "/x"), "[a\\[0\\]](/x)");
    }
}
