//! Layout chrome shared by every page: brand, navigation and the viewer.

use crate::domain::entities::UserRecord;
use crate::presentation::views::{
    BrandView, LayoutChrome, NavigationLinkView, NavigationView, PageMetaView, ViewerView,
};

pub const SITE_TITLE: &str = "Yatube";

/// Build the chrome for a request. `current_path` marks the active link.
pub fn build_chrome(viewer: Option<&UserRecord>, current_path: &str) -> LayoutChrome {
    let mut entries = vec![link("Home", "/", current_path)];
    match viewer {
        Some(user) => {
            entries.push(link("New post", "/create/", current_path));
            entries.push(link("Subscriptions", "/follow/", current_path));
            entries.push(link(
                "My profile",
                &format!("/profile/{}/", user.username),
                current_path,
            ));
            entries.push(link("Log out", "/auth/logout/", current_path));
        }
        None => {
            entries.push(link("Log in", "/auth/login/", current_path));
            entries.push(link("Sign up", "/auth/signup/", current_path));
        }
    }

    LayoutChrome {
        brand: BrandView {
            title: SITE_TITLE.to_string(),
            href: "/".to_string(),
        },
        navigation: NavigationView { entries },
        viewer: viewer.map(|user| ViewerView {
            username: user.username.clone(),
            display_name: user.to_string(),
        }),
        meta: PageMetaView {
            title: SITE_TITLE.to_string(),
        },
    }
}

fn link(label: &str, href: &str, current_path: &str) -> NavigationLinkView {
    NavigationLinkView {
        label: label.to_string(),
        href: href.to_string(),
        active: href == current_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn guests_see_login_links() {
        let chrome = build_chrome(None, "/auth/login/");
        let labels: Vec<_> = chrome
            .navigation
            .entries
            .iter()
            .map(|entry| entry.label.as_str())
            .collect();
        assert!(labels.contains(&"Log in"));
        assert!(!labels.contains(&"New post"));
        assert!(chrome.navigation.entries.iter().any(|entry| entry.active));
        assert!(chrome.viewer.is_none());
    }

    #[test]
    fn users_see_their_profile_link() {
        let user = UserRecord {
            id: 3,
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            created_at: datetime!(2024-01-01 0:00 UTC),
        };
        let chrome = build_chrome(Some(&user), "/");
        assert!(
            chrome
                .navigation
                .entries
                .iter()
                .any(|entry| entry.href == "/profile/leo/")
        );
        assert_eq!(chrome.viewer.expect("viewer").username, "leo");
    }
}
