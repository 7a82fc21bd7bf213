//! Route-to-page binding.
//!
//! Patterns are matched segment by segment:
//!
//! - `/objects` matches exactly `/objects`
//! - `/objects/:class` binds one segment to `class`
//! - `/reports/*` matches `/reports` and anything below it
//!
//! A literal segment never matches a longer or shorter word, so
//! `/custom-objects` does not resolve to the `/objects` page. When several
//! patterns match, the one with the most literal segments wins, then the
//! one added first.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

#[derive(Debug, Clone)]
struct Route {
    pattern: String,
    segments: Vec<Segment>,
    page_id: String,
}

impl Route {
    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    fn matches(&self, path: &[&str]) -> Option<IndexMap<String, String>> {
        let mut params = IndexMap::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => return Some(params),
                Segment::Literal(literal) => {
                    if path.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = path.get(i)?;
                    params.insert(name.clone(), (*value).to_owned());
                }
            }
        }
        (path.len() == self.segments.len()).then_some(params)
    }
}

/// Result of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatch {
    /// Page bound to the matching pattern.
    pub page_id: String,
    /// The pattern that matched.
    pub pattern: String,
    /// Values bound by `:param` segments.
    pub params: IndexMap<String, String>,
}

/// Ordered table of route patterns.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `pattern` to `page_id`.
    pub fn insert(
        &mut self,
        pattern: impl Into<String>,
        page_id: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let pattern = pattern.into();
        let segments = parse_pattern(&pattern)?;
        self.routes.push(Route {
            pattern,
            segments,
            page_id: page_id.into(),
        });
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_route(
        mut self,
        pattern: impl Into<String>,
        page_id: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        self.insert(pattern, page_id)?;
        Ok(self)
    }

    /// Best match for `path`, ignoring any query string or fragment.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let segments = path_segments(path);
        let mut best: Option<(&Route, IndexMap<String, String>)> = None;
        for route in &self.routes {
            let Some(params) = route.matches(&segments) else {
                continue;
            };
            let better = best
                .as_ref()
                .is_none_or(|(current, _)| route.literal_count() > current.literal_count());
            if better {
                best = Some((route, params));
            }
        }
        best.map(|(route, params)| RouteMatch {
            page_id: route.page_id.clone(),
            pattern: route.pattern.clone(),
            params,
        })
    }

    /// Patterns and their pages, in insertion order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|r| (r.pattern.as_str(), r.page_id.as_str()))
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RegistryError> {
    let invalid = |reason| RegistryError::InvalidRoute {
        pattern: pattern.to_owned(),
        reason,
    };

    if !pattern.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    for (i, part) in raw.iter().enumerate() {
        let segment = match *part {
            "*" if i + 1 == raw.len() => Segment::Wildcard,
            "*" => return Err(invalid("'*' is only allowed as the last segment")),
            p if p.starts_with(':') => {
                let name = &p[1..];
                if name.is_empty() {
                    return Err(invalid("parameter segment needs a name"));
                }
                Segment::Param(name.to_owned())
            }
            p => Segment::Literal(p.to_owned()),
        };
        segments.push(segment);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn table() -> RouteTable {
        RouteTable::new()
            .with_route("/", "dashboard")
            .and_then(|t| t.with_route("/objects", "objects"))
            .and_then(|t| t.with_route("/objects/:class", "objects"))
            .and_then(|t| t.with_route("/objects/:class/:id", "objects"))
            .and_then(|t| t.with_route("/reports/*", "reports"))
            .and_then(|t| t.with_route("/reports/new", "report-builder"))
            .unwrap()
    }

    #[rstest]
    #[case("/", Some("dashboard"))]
    #[case("/objects", Some("objects"))]
    #[case("/objects/", Some("objects"))]
    #[case("/objects/Customer", Some("objects"))]
    #[case("/objects/Customer/abc?tab=fields", Some("objects"))]
    #[case("/reports", Some("reports"))]
    #[case("/reports/2024/q1", Some("reports"))]
    #[case("/reports/new", Some("report-builder"))]
    #[case("/custom-objects", None)]
    #[case("/objectsx", None)]
    #[case("/objects/a/b/c", None)]
    fn resolves(#[case] path: &str, #[case] page: Option<&str>) {
        assert_eq!(table().resolve(path).map(|m| m.page_id).as_deref(), page);
    }

    #[test]
    fn binds_params() {
        let m = table().resolve("/objects/Customer/abc").unwrap();
        assert_eq!(m.pattern, "/objects/:class/:id");
        assert_eq!(m.params.get("class").map(String::as_str), Some("Customer"));
        assert_eq!(m.params.get("id").map(String::as_str), Some("abc"));
    }

    #[test]
    fn ties_go_to_first_inserted() {
        let table = RouteTable::new()
            .with_route("/a/:x", "first")
            .and_then(|t| t.with_route("/a/:y", "second"))
            .unwrap();
        assert_eq!(table.resolve("/a/1").unwrap().page_id, "first");
    }

    #[rstest]
    #[case("objects")]
    #[case("/a/*/b")]
    #[case("/a/:")]
    fn rejects_bad_patterns(#[case] pattern: &str) {
        assert!(matches!(
            RouteTable::new().insert(pattern, "p"),
            Err(RegistryError::InvalidRoute { .. })
        ));
    }
}
