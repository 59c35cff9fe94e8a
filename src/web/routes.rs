use axum::routing::MethodFilter;
use serde::Serialize;

pub const API_NAME: &str = "contacts";
pub const API_VERSION: &str = "v1";

/// Operations exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    InsertContact,
    UpdateContact,
    DeleteContact,
    GetContact,
    ListContacts,
    InsertContacts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Delete,
}

impl HttpVerb {
    pub fn filter(self) -> MethodFilter {
        match self {
            HttpVerb::Get => MethodFilter::GET,
            HttpVerb::Post => MethodFilter::POST,
            HttpVerb::Delete => MethodFilter::DELETE,
        }
    }
}

/// One row of the route table.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(skip)]
    pub method: ApiMethod,
    pub name: &'static str,
    pub http_method: HttpVerb,
    /// Path relative to the API base, with `{param}` placeholders.
    pub path: &'static str,
}

impl RouteSpec {
    /// Path in the router's `:param` syntax.
    pub fn router_path(&self) -> String {
        self.path.replace("{id}", ":id")
    }

    /// Fully qualified RPC name, e.g. `contacts.getContact`.
    pub fn rpc_name(&self) -> String {
        format!("{API_NAME}.{}", self.name)
    }
}

pub const ROUTES: &[RouteSpec] = &[
    RouteSpec {
        method: ApiMethod::InsertContact,
        name: "insertContact",
        http_method: HttpVerb::Post,
        path: "/contact/insert",
    },
    RouteSpec {
        method: ApiMethod::UpdateContact,
        name: "updateContact",
        http_method: HttpVerb::Post,
        path: "/contact/update",
    },
    RouteSpec {
        method: ApiMethod::DeleteContact,
        name: "deleteContact",
        http_method: HttpVerb::Delete,
        path: "/contact/delete/{id}",
    },
    RouteSpec {
        method: ApiMethod::GetContact,
        name: "getContact",
        http_method: HttpVerb::Get,
        path: "/contact/{id}",
    },
    RouteSpec {
        method: ApiMethod::ListContacts,
        name: "listContacts",
        http_method: HttpVerb::Get,
        path: "/contacts",
    },
    RouteSpec {
        method: ApiMethod::InsertContacts,
        name: "insertContacts",
        http_method: HttpVerb::Post,
        path: "/contacts",
    },
];

/// Looks up a route by bare (`getContact`) or qualified (`contacts.getContact`) name.
pub fn find(name: &str) -> Option<&'static RouteSpec> {
    let bare = name
        .strip_prefix(API_NAME)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name);
    ROUTES.iter().find(|route| route.name == bare)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_and_verb_path_pairs_are_unique() {
        let names: HashSet<_> = ROUTES.iter().map(|r| r.name).collect();
        let pairs: HashSet<_> = ROUTES.iter().map(|r| (r.http_method, r.path)).collect();
        assert_eq!(names.len(), ROUTES.len());
        assert_eq!(pairs.len(), ROUTES.len());
    }

    #[test]
    fn find_accepts_bare_and_qualified_names() {
        assert_eq!(find("getContact").map(|r| r.method), Some(ApiMethod::GetContact));
        assert_eq!(
            find("contacts.insertContacts").map(|r| r.method),
            Some(ApiMethod::InsertContacts)
        );
        assert!(find("contacts.dropAll").is_none());
        assert!(find("other.getContact").is_none());
    }

    #[test]
    fn router_path_uses_colon_params() {
        let delete = find("deleteContact").unwrap();
        assert_eq!(delete.router_path(), "/contact/delete/:id");
        assert_eq!(delete.rpc_name(), "contacts.deleteContact");
    }
}
