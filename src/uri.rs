//! Uniform Resource Identifier parsing and rendering, built on the grammar
//! engine as its first client.
//!
//! The grammar is the URI-reference of RFC 2396 wired onto a copy of the
//! core ruleset, terminated by `WSP / <eof>` so a reference embedded in a
//! larger stream stops at the first break. The wired ruleset is built once
//! and copied per parse, so concurrent parses never share state.

use core::fmt;
use std::io::Cursor;
use std::str::FromStr;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::{RuleId, Ruleset, Source};

/// The input did not match the URI-reference grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("input does not match the uri-reference grammar")]
pub struct InvalidUri;

/// A parsed URI reference.
///
/// Unset string components are empty; an unset port is zero. The path is a
/// sequence of segments where a leading literal `"/"` marks an absolute
/// path. The query is an ordered multimap: pairs are sorted by key, and
/// pairs with equal keys keep their order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    userinfo: String,
    host: String,
    fragment: String,
    port: u32,
    path: Vec<String>,
    query: Vec<(String, String)>,
}

impl Uri {
    /// Parses a URI reference from the cursor position of `src`.
    ///
    /// On success the cursor rests just past the reference and its
    /// terminating whitespace, if any; on failure the cursor does not move.
    pub fn read<S: Source + ?Sized>(src: &mut S) -> Result<Uri, InvalidUri> {
        let mut rules = URI_RULES.clone();
        let top = rules.get("uri-read");
        if !rules.read(top, src) {
            return Err(InvalidUri);
        }
        Ok(Uri::extract(&rules, src))
    }

    /// True when no scheme is present.
    pub fn relative(&self) -> bool {
        self.scheme.is_empty()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn userinfo(&self) -> &str {
        &self.userinfo
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn port(&self) -> u32 {
        self.port
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    fn extract<S: Source + ?Sized>(rules: &Ruleset, src: &mut S) -> Uri {
        let scheme = rule_text(rules, src, "scheme", 0).unwrap_or_default();
        let userinfo = rule_text(rules, src, "userinfo", 0).unwrap_or_default();
        let host = rule_text(rules, src, "host", 0).unwrap_or_default();
        let fragment = rule_text(rules, src, "fragment", 0).unwrap_or_default();
        let port = rule_text(rules, src, "port", 0)
            .and_then(|text| text.parse().ok())
            .unwrap_or(0);

        let mut path = Vec::new();
        if let Some(lead) = rule_text(rules, src, "rel-segment", 0) {
            path.push(lead);
        } else if rules.read_count(rules.get("abs-path")) > 0 {
            path.push("/".to_string());
        }
        let segment = rules.get("segment");
        for n in 0..rules.read_count(segment) {
            if let Some(text) = rule_text(rules, src, "segment", n) {
                path.push(text);
            }
        }

        let mut query = Vec::new();
        if let Some(raw) = rule_text(rules, src, "query", 0) {
            for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
                match pair.split_once('=') {
                    Some((key, value)) => query.push((key.to_string(), value.to_string())),
                    None => query.push((pair.to_string(), String::new())),
                }
            }
            // multimap order: sorted by key, stable among equal keys
            query.sort_by(|a, b| a.0.cmp(&b.0));
        }

        Uri {
            scheme,
            userinfo,
            host,
            fragment,
            port,
            path,
            query,
        }
    }
}

impl FromStr for Uri {
    type Err = InvalidUri;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::read(&mut Cursor::new(s.as_bytes()))
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.userinfo.is_empty() || !self.host.is_empty() {
            f.write_str("//")?;
        }
        if !self.userinfo.is_empty() {
            write!(f, "{}@", self.userinfo)?;
        }
        f.write_str(&self.host)?;
        if self.port != 0 {
            write!(f, ":{}", self.port)?;
        }
        for (n, segment) in self.path.iter().enumerate() {
            // separators are implied, except around a literal "/" segment
            if segment == "/" {
                f.write_str("/")?;
            } else {
                if n > 0 && self.path[n - 1] != "/" {
                    f.write_str("/")?;
                }
                f.write_str(segment)?;
            }
        }
        if !self.query.is_empty() {
            f.write_str("?")?;
            for (n, (key, value)) in self.query.iter().enumerate() {
                if n > 0 {
                    f.write_str("&")?;
                }
                f.write_str(key)?;
                if !value.is_empty() {
                    write!(f, "={value}")?;
                }
            }
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

fn rule_text<S: Source + ?Sized>(
    rules: &Ruleset,
    src: &mut S,
    name: &str,
    n: usize,
) -> Option<String> {
    let rule = rules.get(name);
    if n >= rules.read_count(rule) {
        return None;
    }
    let mut buf = Vec::new();
    let _ = rules.write(rule, n, src, &mut buf);
    Some(String::from_utf8_lossy(&buf).into_owned())
}

static URI_RULES: Lazy<Ruleset> = Lazy::new(uri_ruleset);

/// RFC 2396 URI-reference.
fn uri_ruleset() -> Ruleset {
    let mut rs = Ruleset::core();
    let alpha = rs.get("ALPHA");
    let digit = rs.get("DIGIT");
    let hexdig = rs.get("HEXDIG");
    let wsp = rs.get("WSP");

    let alphanum = rs.alternate(alpha, digit).unwrap();
    let mark = rs.any_of("-_.!~*'()");
    let unreserved = rs.alternate(alphanum, mark).unwrap();
    let percent = rs.byte(b'%');
    let escaped = seq(&mut rs, &[percent, hexdig, hexdig]);
    let reserved = rs.any_of(";/?:@&=+$,");
    let uric = alts(&mut rs, &[reserved, unreserved, escaped]);

    let fragment = rs.repeat(0.., uric).unwrap();
    let query = rs.repeat(0.., uric).unwrap();

    let pchar_extra = rs.any_of(":@&=+$,");
    let pchar = alts(&mut rs, &[unreserved, escaped, pchar_extra]);
    let pchars = rs.repeat(0.., pchar).unwrap();
    let param = rs.repeat(0.., pchar).unwrap();
    let semicolon = rs.byte(b';');
    let param_part = rs.concat(semicolon, param).unwrap();
    let param_parts = rs.repeat(0.., param_part).unwrap();
    let segment = rs.concat(pchars, param_parts).unwrap();

    let slash = rs.byte(b'/');
    let slash_segment = rs.concat(slash, segment).unwrap();
    let more_segments = rs.repeat(0.., slash_segment).unwrap();
    let path_segments = rs.concat(segment, more_segments).unwrap();
    let abs_path = rs.concat(slash, path_segments).unwrap();
    let opt_abs_path = opt(&mut rs, abs_path);

    let rel_char_extra = rs.any_of(";@&=+$,");
    let rel_char = alts(&mut rs, &[unreserved, escaped, rel_char_extra]);
    let rel_segment = rs.repeat(1.., rel_char).unwrap();
    let rel_path = rs.concat(rel_segment, opt_abs_path).unwrap();

    let port = rs.repeat(0.., digit).unwrap();

    let digits = rs.repeat(1.., digit).unwrap();
    let dot = rs.byte(b'.');
    let ipv4 = seq(&mut rs, &[digits, dot, digits, dot, digits, dot, digits]);

    let hyphen = rs.byte(b'-');
    let label_char = rs.alternate(alphanum, hyphen).unwrap();
    let label_chars = rs.repeat(0.., label_char).unwrap();
    let long_domainlabel = seq(&mut rs, &[alphanum, label_chars, alphanum]);
    let domainlabel = rs.alternate(long_domainlabel, alphanum).unwrap();
    let long_toplabel = seq(&mut rs, &[alpha, label_chars, alphanum]);
    let toplabel = rs.alternate(long_toplabel, alpha).unwrap();
    let label_dot = rs.concat(domainlabel, dot).unwrap();
    let label_dots = rs.repeat(0.., label_dot).unwrap();
    let opt_dot = opt(&mut rs, dot);
    let hostname = seq(&mut rs, &[label_dots, toplabel, opt_dot]);
    let host = rs.alternate(hostname, ipv4).unwrap();

    let colon = rs.byte(b':');
    let port_part = rs.concat(colon, port).unwrap();
    let opt_port = opt(&mut rs, port_part);
    let hostport = rs.concat(host, opt_port).unwrap();

    let user_char_extra = rs.any_of(";:&=+$,");
    let user_char = alts(&mut rs, &[unreserved, escaped, user_char_extra]);
    let userinfo = rs.repeat(0.., user_char).unwrap();
    let at = rs.byte(b'@');
    let userinfo_at = rs.concat(userinfo, at).unwrap();
    let opt_userinfo = opt(&mut rs, userinfo_at);
    let server_core = rs.concat(opt_userinfo, hostport).unwrap();
    let server = opt(&mut rs, server_core);

    let reg_char_extra = rs.any_of("$,;:@&=+");
    let reg_char = alts(&mut rs, &[unreserved, escaped, reg_char_extra]);
    let reg_name = rs.repeat(1.., reg_char).unwrap();
    let authority = rs.alternate(server, reg_name).unwrap();

    let slashes = rs.literal("//");
    let net_path = seq(&mut rs, &[slashes, authority, opt_abs_path]);

    let scheme_extra = rs.any_of("+-.");
    let scheme_char = alts(&mut rs, &[alpha, digit, scheme_extra]);
    let scheme_chars = rs.repeat(0.., scheme_char).unwrap();
    let scheme = rs.concat(alpha, scheme_chars).unwrap();

    let question = rs.byte(b'?');
    let query_part = rs.concat(question, query).unwrap();
    let opt_query = opt(&mut rs, query_part);

    let net_or_abs = rs.alternate(net_path, abs_path).unwrap();
    let hier_part = rs.concat(net_or_abs, opt_query).unwrap();

    let opaque_lead_extra = rs.any_of(";?:@&=+$,");
    let opaque_lead = alts(&mut rs, &[unreserved, escaped, opaque_lead_extra]);
    let urics = rs.repeat(0.., uric).unwrap();
    let opaque_part = rs.concat(opaque_lead, urics).unwrap();

    let hier_or_opaque = rs.alternate(hier_part, opaque_part).unwrap();
    let absolute_uri = seq(&mut rs, &[scheme, colon, hier_or_opaque]);

    let rel_kind = alts(&mut rs, &[net_path, abs_path, rel_path]);
    let relative_uri = rs.concat(rel_kind, opt_query).unwrap();

    let any_uri = rs.alternate(absolute_uri, relative_uri).unwrap();
    let opt_uri = opt(&mut rs, any_uri);
    let hash = rs.byte(b'#');
    let fragment_part = rs.concat(hash, fragment).unwrap();
    let opt_fragment = opt(&mut rs, fragment_part);
    let uri_reference = rs.concat(opt_uri, opt_fragment).unwrap();

    let eof = rs.eof();
    let stop = rs.alternate(wsp, eof).unwrap();
    let uri_read = rs.concat(uri_reference, stop).unwrap();

    let defs = [
        ("scheme", scheme),
        ("userinfo", userinfo),
        ("host", host),
        ("port", port),
        ("abs-path", abs_path),
        ("rel-segment", rel_segment),
        ("segment", segment),
        ("query", query),
        ("fragment", fragment),
        ("uri-reference", uri_reference),
        ("uri-read", uri_read),
    ];
    for (name, rule) in defs {
        rs.define(name, rule).unwrap();
    }
    rs
}

fn seq(rs: &mut Ruleset, rules: &[RuleId]) -> RuleId {
    rules
        .iter()
        .copied()
        .reduce(|left, right| rs.concat(left, right).unwrap())
        .unwrap()
}

fn alts(rs: &mut Ruleset, rules: &[RuleId]) -> RuleId {
    rules
        .iter()
        .copied()
        .reduce(|left, right| rs.alternate(left, right).unwrap())
        .unwrap()
}

fn opt(rs: &mut Ruleset, rule: RuleId) -> RuleId {
    rs.repeat(0..=1, rule).unwrap()
}
