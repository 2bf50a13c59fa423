use crate::config::StealthSettings;
use crate::domain::ports::Browser;
use crate::utils::error::Result;
use serde_json::{json, Value};

const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(Object.getPrototypeOf(navigator), 'webdriver', { get: () => undefined });";

const CHROME_RUNTIME: &str = "window.chrome = window.chrome || {}; window.chrome.runtime = window.chrome.runtime || {};";

const HAIRLINE_FIX: &str = r#"(() => {
  const desc = Object.getOwnPropertyDescriptor(HTMLElement.prototype, 'offsetHeight');
  Object.defineProperty(HTMLDivElement.prototype, 'offsetHeight', {
    ...desc,
    get: function () { return this.id === 'modernizr' ? 1 : desc.get.apply(this); },
  });
})();"#;

/// Scripts evaluated before any page script on every new document.
pub fn scripts(settings: &StealthSettings) -> Vec<String> {
    let mut scripts = vec![HIDE_WEBDRIVER.to_string(), CHROME_RUNTIME.to_string()];

    scripts.push(navigator_getter("languages", &json!(settings.languages)));
    scripts.push(navigator_getter("vendor", &json!(settings.vendor)));
    scripts.push(navigator_getter("platform", &json!(settings.platform)));
    scripts.push(format!(
        r#"(() => {{
  const patch = (proto) => {{
    const getParameter = proto.getParameter;
    proto.getParameter = function (parameter) {{
      if (parameter === 37445) return {vendor};
      if (parameter === 37446) return {renderer};
      return getParameter.call(this, parameter);
    }};
  }};
  patch(WebGLRenderingContext.prototype);
  if (window.WebGL2RenderingContext) patch(WebGL2RenderingContext.prototype);
}})();"#,
        vendor = json!(settings.webgl_vendor),
        renderer = json!(settings.renderer),
    ));

    if settings.fix_hairline {
        scripts.push(HAIRLINE_FIX.to_string());
    }
    scripts
}

fn navigator_getter(property: &str, value: &Value) -> String {
    format!(
        "Object.defineProperty(Object.getPrototypeOf(navigator), '{}', {{ get: () => {} }});",
        property, value
    )
}

/// Masks the usual automation fingerprints of a fresh session.
pub async fn apply(browser: &dyn Browser, settings: &StealthSettings, user_agent: &str) -> Result<()> {
    if !settings.enabled {
        return Ok(());
    }

    for source in scripts(settings) {
        browser
            .cdp(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": source }),
            )
            .await?;
    }

    browser
        .cdp(
            "Network.setUserAgentOverride",
            json!({
                "userAgent": user_agent.replace("HeadlessChrome", "Chrome"),
                "acceptLanguage": settings.languages.join(","),
                "platform": settings.platform,
            }),
        )
        .await?;

    tracing::debug!("Stealth patches applied");
    Ok(())
}
