//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::ACCESS_TOKEN_ENV;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("languages"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }

    let config_content = format!(
        r#"# spacetraveling configuration

# Site
title: spacetraveling
language: pt-BR
# IANA timezone used for publication dates, UTC when empty
timezone: ''
root: /

# Directory
public_dir: public
languages_dir: languages

# Posts
## date-fns style tokens: yyyy MMMM MMM MM dd HH mm ss
date_format: dd MMM yyyy
words_per_minute: 200

# Seconds before a served page is regenerated
revalidate: 1800

# Content repository
## The access token can also be set with {}
content:
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  access_token:
  document_type: posts
  page_size: 2
  fetch:
    - posts.title
    - posts.subtitle
    - posts.author
"#,
        ACCESS_TOKEN_ENV
    );
    fs::write(&config_path, config_content)?;

    let language_sample = r#"# Strings overriding the built-in pt-BR translations
load_more: Carregar mais posts
loading: Carregando...
not_found: Post não encontrado
reading_time: "%d min"
"#;
    fs::write(target_dir.join("languages/pt-BR.yml"), language_sample)?;

    Ok(())
}
