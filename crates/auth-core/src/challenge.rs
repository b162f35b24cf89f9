// RFC 7616 Section 3.3 - The WWW-Authenticate response header
//
// challenge       = "Digest" 1*SP digest-params
// digest-params   = auth-param *( OWS "," OWS auth-param )
// auth-param      = token BWS "=" BWS ( token / quoted-string )

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag_no_case, take_while1},
    character::complete::{anychar, char, multispace0, multispace1, space0},
    combinator::{all_consuming, eof, map, opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated, tuple},
    IResult,
};
use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::types::{Algorithm, DigestChallenge, Qop};

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

// token = 1*tchar
fn token(input: &str) -> IResult<&str, &str> {
    take_while1(is_token_char)(input)
}

// Some cameras send unquoted values that are not strict tokens (base64 nonces).
fn bare_value(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ',' && c != '"' && !c.is_whitespace())(input)
}

// quoted-string = DQUOTE *( qdtext / quoted-pair ) DQUOTE
fn quoted_string(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            recognize(many0(alt((
                is_not("\\\""),
                recognize(pair(char('\\'), anychar)),
            )))),
            char('"'),
        ),
        unescape,
    )(input)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn directive(input: &str) -> IResult<&str, (&str, String)> {
    separated_pair(
        token,
        tuple((space0, char('='), space0)),
        alt((quoted_string, map(bare_value, String::from))),
    )(input)
}

fn list_separator(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn directive_list(input: &str) -> IResult<&str, Vec<(&str, String)>> {
    terminated(
        separated_list0(list_separator, directive),
        pair(opt(list_separator), multispace0),
    )(input)
}

fn digest_scheme(input: &str) -> IResult<&str, &str> {
    terminated(tag_no_case("Digest"), alt((multispace1, eof)))(input)
}

/// Splits a comma-separated `key=value` / `key="value"` list into pairs.
///
/// Keys are lower-cased, quoted values are unescaped with surrounding quotes
/// stripped. Usable for both challenge and credentials parameter lists.
pub fn parse_directives(params: &str) -> Result<Vec<(String, String)>> {
    let (_, pairs) = all_consuming(directive_list)(params.trim())
        .map_err(|e| AuthError::ChallengeUnparseable(format!("malformed directive list: {}", e)))?;

    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect())
}

/// Parses the literal value of a `WWW-Authenticate` header into a challenge.
///
/// The value must start with the `Digest` scheme (case-insensitive). Unknown
/// directives are ignored. `algorithm` defaults to MD5.
pub fn parse_challenge(header: &str) -> Result<DigestChallenge> {
    let trimmed = header.trim();
    let (params, _) = digest_scheme(trimmed).map_err(|_| {
        AuthError::ChallengeUnparseable(format!("expected Digest scheme in '{}'", trimmed))
    })?;

    let mut realm = None;
    let mut nonce = None;
    let mut qop = None;
    let mut opaque = None;
    let mut algorithm = Algorithm::default();
    let mut stale = false;

    for (key, value) in parse_directives(params)? {
        match key.as_str() {
            "realm" => realm = Some(value),
            "nonce" => nonce = Some(value),
            "qop" => {
                qop = Qop::select(&value);
                if qop.is_none() {
                    warn!("Ignoring unsupported qop options: {}", value);
                }
            }
            "opaque" => opaque = Some(value),
            "algorithm" => algorithm = value.parse()?,
            "stale" => stale = value.eq_ignore_ascii_case("true"),
            other => debug!("Ignoring digest directive '{}'", other),
        }
    }

    let realm = realm.ok_or(AuthError::ChallengeMissingField("realm"))?;
    let nonce = nonce.ok_or(AuthError::ChallengeMissingField("nonce"))?;

    Ok(DigestChallenge {
        realm,
        nonce,
        qop,
        opaque,
        algorithm,
        stale,
    })
}

/// Picks the Digest challenge out of a response's `WWW-Authenticate` values.
///
/// Servers may offer several schemes; the first Digest one wins, otherwise the
/// first value is returned so the caller gets a meaningful parse error.
pub fn select_digest_header<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut first = None;
    for value in values {
        if digest_scheme(value.trim_start()).is_ok() {
            return Some(value);
        }
        first.get_or_insert(value);
    }
    first
}
