#![allow(dead_code)]

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use obs_import::story::{CHAPTER_COUNT, expected_frame_count};

pub type Routes = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Serves `routes` on an ephemeral port until the returned sender is used or dropped.
pub struct StoryServer {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StoryServer {
    pub fn spawn(routes: Routes) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let response = match routes(request.url()) {
                    Some(body) => tiny_http::Response::from_string(body).with_status_code(200),
                    None => tiny_http::Response::from_string("not found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn repo_url(&self) -> String {
        format!("{}/github/en-obs", self.base_url)
    }

    pub fn languages_url(&self) -> String {
        format!("{}/exports/langnames.json", self.base_url)
    }

    pub fn status_url(&self) -> String {
        format!("{}/uwadmin", self.base_url)
    }
}

impl Drop for StoryServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub const LANGNAMES_JSON: &str = r#"[
  {"lc": "en", "ln": "English", "ang": "English", "ld": "ltr", "gw": true},
  {"lc": "ar", "ln": "العربية", "ang": "Arabic", "ld": "rtl"}
]"#;

pub const STATUS_TXT: &str = "\
{{https://door43.org/_media/en/obs/status.png}}\n\
\n\
checking_entity: Distant Shores Media; Wycliffe Associates\n\
checking_level: 3\n\
comments: Original source text\n\
contributors: Door43 World Missions Community\n\
publish_date: 2015-12-08\n\
source_text: en\n\
source_text_version: 4\n\
version: 4\n";

pub const FRONT_MATTER: &str = "\
====== Open Bible Stories ======\n\
\n\
**An unrestricted visual mini-Bible in any language**\n\
\n\
[[http://openbiblestories.org|http://openbiblestories.org]]\n";

pub const BACK_MATTER: &str = "\
===== Who is Jesus? =====\n\
\n\
//Jesus is the Son of God.//\n";

/// DokuWiki source of chapter `number`, optionally leaving out one frame.
pub fn chapter_markup(number: u8, skip_frame: Option<u8>) -> String {
    let mut markup = format!("====== {number}. Story {number} ======\r\n\r\n");
    for frame in 1..=expected_frame_count(number).unwrap() {
        if skip_frame == Some(frame) {
            continue;
        }
        markup.push_str(&format!(
            "{{{{https://api.unfoldingword.org/obs/jpg/1/en/360px/obs-en-{number:02}-{frame:02}.jpg}}}}\r\n\r\n\
             Frame {frame} of story {number}.\r\n\r\n"
        ));
    }
    markup.push_str(&format!("//A Bible story from: Genesis {number}//\r\n"));
    markup
}

/// Routes for a complete English repository; `skip` drops one `(chapter, frame)`.
pub fn story_routes(skip: Option<(u8, u8)>) -> Routes {
    Arc::new(move |path: &str| {
        if path == "/exports/langnames.json" {
            return Some(LANGNAMES_JSON.to_owned());
        }
        if path == "/uwadmin/en/obs/status.txt" {
            return Some(STATUS_TXT.to_owned());
        }

        let document = path.strip_prefix("/github/en-obs/master/obs/")?;
        match document {
            "front-matter.txt" => Some(FRONT_MATTER.to_owned()),
            "back-matter.txt" => Some(BACK_MATTER.to_owned()),
            _ => {
                let number: u8 = document.strip_suffix(".txt")?.parse().ok()?;
                if number == 0 || number > CHAPTER_COUNT {
                    return None;
                }
                let skip_frame = skip
                    .filter(|(chapter, _)| *chapter == number)
                    .map(|(_, frame)| frame);
                Some(chapter_markup(number, skip_frame))
            }
        }
    })
}
