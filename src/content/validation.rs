//! Validation of content update payloads.
//!
//! # Responsibilities
//! - Check every required field of the six editable sections
//! - Check price and email formats, and map coordinates
//! - Split the map API key off the contact section
//!
//! # Design Decisions
//! - Sections are checked in document order: hero, about, menu, team,
//!   contact, footer
//! - The first failing rule aborts the update; nothing is collected
//! - Validation is pure: the payload is never persisted from here

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::content::model::{
    parse_coordinate, About, Contact, ContentDocument, Footer, Hero, MenuItem, TeamMember,
};
use crate::error::{CmsError, CmsResult};

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?\d+(\.\d{2})?$").expect("price pattern"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

/// Basic `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Currency check: digits with optional cents, one leading `$` allowed.
pub fn is_valid_price(price: &str) -> bool {
    let stripped = price.strip_prefix('$').unwrap_or(price);
    PRICE_RE.is_match(stripped)
}

/// A payload that passed every rule, ready to be applied to the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpdate {
    pub hero: Hero,
    pub about: About,
    pub menu: Vec<MenuItem>,
    pub team: Vec<TeamMember>,
    /// Contact section with the API key stripped.
    pub contact: Contact,
    pub footer: Footer,
    /// `None` when the payload omitted the key, `Some(None)` when it was
    /// submitted empty (clears it), `Some(Some(k))` when a key was supplied.
    pub google_maps_api_key: Option<Option<String>>,
}

impl ValidatedUpdate {
    /// Replace the six sections of `doc` wholesale.
    ///
    /// The stored map API key is kept unless the payload supplied one.
    pub fn apply_to(self, doc: &mut ContentDocument) {
        let previous_key = doc.contact.google_maps_api_key.take();

        doc.hero = self.hero;
        doc.about = self.about;
        doc.menu = self.menu;
        doc.team = self.team;
        doc.contact = self.contact;
        doc.footer = self.footer;

        doc.contact.google_maps_api_key = match self.google_maps_api_key {
            Some(submitted) => submitted,
            None => previous_key,
        };
    }
}

/// Validate an untrusted, document-shaped update payload.
pub fn validate_update(payload: &Value) -> CmsResult<ValidatedUpdate> {
    let root = payload
        .as_object()
        .ok_or_else(|| CmsError::validation("Update payload must be a JSON object."))?;

    let hero = validate_hero(section(root, "hero")?)?;
    let about = validate_about(section(root, "about")?)?;
    let menu = validate_menu(list(root, "menu")?)?;
    let team = validate_team(list(root, "team")?)?;
    let (contact, google_maps_api_key) = validate_contact(section(root, "contact")?)?;
    let footer = validate_footer(section(root, "footer")?)?;

    Ok(ValidatedUpdate {
        hero,
        about,
        menu,
        team,
        contact,
        footer,
        google_maps_api_key,
    })
}

fn validate_hero(hero: &Map<String, Value>) -> CmsResult<Hero> {
    let title = required(hero, "title", "hero")?;
    let subtitle = required(hero, "subtitle", "hero")?;
    let button_text = required(hero, "button_text", "hero")?;
    let image = optional(hero, "image", "hero")?;

    if let Some(name) = &image {
        if crate::assets::filename::secure_filename(name) != *name {
            return Err(CmsError::validation(format!(
                "hero.image is not a valid asset filename: {name}"
            )));
        }
    }

    Ok(Hero {
        title,
        subtitle,
        button_text,
        image,
    })
}

fn validate_about(about: &Map<String, Value>) -> CmsResult<About> {
    Ok(About {
        who: required(about, "who", "about")?,
        why: required(about, "why", "about")?,
    })
}

fn validate_menu(items: &[Value]) -> CmsResult<Vec<MenuItem>> {
    let mut menu = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let ctx = format!("menu[{i}]");
        let item = as_object(item, &ctx)?;

        let name = required(item, "name", &ctx)?;
        let description = required(item, "description", &ctx)?;
        let price = required(item, "price", &ctx)?;
        if !is_valid_price(&price) {
            return Err(CmsError::validation(format!(
                "{ctx}.price: invalid price for {name}"
            )));
        }

        menu.push(MenuItem {
            name,
            description,
            price,
        });
    }
    Ok(menu)
}

fn validate_team(members: &[Value]) -> CmsResult<Vec<TeamMember>> {
    let mut team = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let ctx = format!("team[{i}]");
        let member = as_object(member, &ctx)?;
        team.push(TeamMember {
            name: required(member, "name", &ctx)?,
            bio: required(member, "bio", &ctx)?,
        });
    }
    Ok(team)
}

fn validate_contact(contact: &Map<String, Value>) -> CmsResult<(Contact, Option<Option<String>>)> {
    let address = required(contact, "address", "contact")?;
    let email = required(contact, "email", "contact")?;
    let phone = required(contact, "phone", "contact")?;
    if !is_valid_email(&email) {
        return Err(CmsError::validation("contact.email: invalid email address."));
    }

    // Each coordinate may be blank; a non-blank one must parse.
    let coordinate = |value: Option<&Value>| match value {
        None => Ok(None),
        Some(v) => parse_coordinate(v).map(Some).ok_or_else(|| {
            CmsError::validation("contact.map_lat/map_lng: invalid latitude or longitude.")
        }),
    };
    let map_lat = coordinate(present(contact, "map_lat"))?;
    let map_lng = coordinate(present(contact, "map_lng"))?;

    let api_key = match contact.get("google_maps_api_key") {
        None | Some(Value::Null) => None,
        Some(Value::String(key)) if key.trim().is_empty() => Some(None),
        Some(Value::String(key)) => Some(Some(key.clone())),
        Some(_) => {
            return Err(CmsError::validation(
                "contact.google_maps_api_key must be a string.",
            ))
        }
    };

    let contact = Contact {
        address,
        email,
        phone,
        map_lat,
        map_lng,
        google_maps_api_key: None,
    };
    Ok((contact, api_key))
}

fn validate_footer(footer: &Map<String, Value>) -> CmsResult<Footer> {
    let address = required(footer, "address", "footer")?;
    let city = required(footer, "city", "footer")?;
    let phone = required(footer, "phone", "footer")?;
    let email = required(footer, "email", "footer")?;
    if !is_valid_email(&email) {
        return Err(CmsError::validation("footer.email: invalid footer email address."));
    }
    Ok(Footer {
        address,
        city,
        phone,
        email,
    })
}

static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

/// A missing section reads as empty, so its first field reports as missing.
fn section<'a>(root: &'a Map<String, Value>, name: &str) -> CmsResult<&'a Map<String, Value>> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(&EMPTY),
        Some(value) => as_object(value, name),
    }
}

/// A missing list section reads as an empty list.
fn list<'a>(root: &'a Map<String, Value>, name: &str) -> CmsResult<&'a [Value]> {
    match root.get(name) {
        None | Some(Value::Null) => Ok(<&[Value]>::default()),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(CmsError::validation(format!("{name} must be a list."))),
    }
}

fn as_object<'a>(value: &'a Value, ctx: &str) -> CmsResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CmsError::validation(format!("{ctx} must be an object.")))
}

fn required(obj: &Map<String, Value>, field: &str, ctx: &str) -> CmsResult<String> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(CmsError::validation(format!("{ctx}.{field} is required.")))
        }
        Some(_) => Err(CmsError::validation(format!(
            "{ctx}.{field} must be a string."
        ))),
    }
}

fn optional(obj: &Map<String, Value>, field: &str, ctx: &str) -> CmsResult<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CmsError::validation(format!(
            "{ctx}.{field} must be a string."
        ))),
    }
}

/// Value of `field` unless it is absent, null or an empty string.
fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}
