//! Google Classroom 门户实现：使用 Headless Chrome 驱动
//!
//! 需启用 feature "browser" 且系统已安装 Chrome/Chromium。
//! 浏览器实例懒启动并在进程生命周期内复用，标签页按操作开关；headless_chrome 是同步 API，
//! 每个操作都放进 spawn_blocking，页面加载带 60s 级超时，挂死的页面不会拖垮调度器。

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, Tab};

use crate::config::PortalSection;
use crate::portal::{Portal, PortalError};
use crate::task::TaskObservation;

/// 待办任务列表中的锚点选择器（Classroom 首页）
const TASK_ANCHOR_SELECTOR: &str = "a.onkcGd.ARTZne";
/// 任务正文容器
const MAIN_SELECTOR: &str = "div[role='main']";

/// Classroom 门户：登录、列表抓取、正文读取、草稿创建
#[derive(Clone)]
pub struct ClassroomPortal {
    base_url: String,
    home_url: String,
    email: String,
    password: String,
    page_load_timeout: Duration,
    settle_wait: Duration,
    browser: Arc<RwLock<Option<Browser>>>,
}

impl ClassroomPortal {
    pub fn new(cfg: &PortalSection, email: &str, password: &str) -> Self {
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            home_url: cfg.home_url.clone(),
            email: email.to_string(),
            password: password.to_string(),
            page_load_timeout: Duration::from_secs(cfg.page_load_timeout_secs),
            settle_wait: Duration::from_millis(cfg.settle_wait_ms),
            browser: Arc::new(RwLock::new(None)),
        }
    }

    /// 按错误文本归类（headless_chrome 的错误类型信息都在 Display 里）
    fn classify(op: &str, e: impl std::fmt::Display) -> PortalError {
        let msg = format!("{}: {}", op, e);
        let lower = msg.to_lowercase();
        if lower.contains("timed out") || lower.contains("timeout") {
            PortalError::NavigationTimeout(msg)
        } else if lower.contains("no element") || lower.contains("not found") {
            PortalError::ElementNotFound(msg)
        } else {
            PortalError::Browser(msg)
        }
    }

    /// 懒启动浏览器并打开新标签页（阻塞调用，仅在 spawn_blocking 内使用）
    fn open_tab(&self) -> Result<Arc<Tab>, PortalError> {
        let mut guard = self
            .browser
            .write()
            .map_err(|e| PortalError::Browser(e.to_string()))?;
        if guard.is_none() {
            let browser =
                Browser::default().map_err(|e| Self::classify("Chrome launch", e))?;
            *guard = Some(browser);
        }
        let browser = guard.as_ref().unwrap();
        let tab = browser
            .new_tab()
            .map_err(|e| Self::classify("Browser tab", e))?;
        tab.set_default_timeout(self.page_load_timeout);
        Ok(tab)
    }

    /// 若被重定向到登录页则执行 邮箱 → 密码 两步登录（阻塞调用）
    fn login_if_needed(&self, tab: &Arc<Tab>) -> Result<(), PortalError> {
        if !tab.get_url().contains("accounts.google.com") {
            return Ok(());
        }
        tracing::info!("Classroom session expired, logging in...");

        let email_input = tab
            .wait_for_element("input[type='email']")
            .map_err(|e| Self::classify("Login email field", e))?;
        email_input
            .click()
            .map_err(|e| Self::classify("Login email field", e))?;
        tab.type_str(&self.email)
            .map_err(|e| Self::classify("Login email input", e))?;
        tab.press_key("Enter")
            .map_err(|e| Self::classify("Login email submit", e))?;
        std::thread::sleep(Duration::from_millis(2000));

        let password_input = tab
            .wait_for_element("input[type='password']")
            .map_err(|e| Self::classify("Login password field", e))?;
        password_input
            .click()
            .map_err(|e| Self::classify("Login password field", e))?;
        tab.type_str(&self.password)
            .map_err(|e| Self::classify("Login password input", e))?;
        tab.press_key("Enter")
            .map_err(|e| Self::classify("Login password submit", e))?;
        tab.wait_until_navigated()
            .map_err(|e| Self::classify("Login navigation", e))?;
        std::thread::sleep(self.settle_wait);

        // 登录后仍停在账号页：凭据被拒或需要二次验证
        if tab.get_url().contains("accounts.google.com") {
            return Err(PortalError::SessionExpired);
        }
        Ok(())
    }

    /// 关闭标签页；失败只记 debug（浏览器实例继续复用）
    ///
    /// 进程常驻，标签页必须逐个回收，否则无限巡查下 Chrome 内存无界增长。
    fn close_tab(tab: &Arc<Tab>) {
        if let Err(e) = tab.close(true) {
            tracing::debug!(error = %e, "Tab close failed");
        }
    }

    /// 在给定标签页打开首页（含登录）并等待主容器就绪（阻塞调用）
    fn goto_home(&self, tab: &Arc<Tab>) -> Result<(), PortalError> {
        tab.navigate_to(&self.home_url)
            .map_err(|e| Self::classify("Navigate home", e))?;
        tab.wait_until_navigated()
            .map_err(|e| Self::classify("Home navigation", e))?;
        self.login_if_needed(tab)?;
        tab.wait_for_element(MAIN_SELECTOR)
            .map_err(|e| Self::classify("Home main content", e))?;
        Ok(())
    }

    /// 在给定标签页打开任务页并等待正文就绪（阻塞调用）
    fn goto_task(&self, tab: &Arc<Tab>, link: &str) -> Result<(), PortalError> {
        let url = if link.starts_with("http") {
            link.to_string()
        } else {
            format!("{}{}", self.base_url, link)
        };
        tab.navigate_to(&url)
            .map_err(|e| Self::classify("Navigate task", e))?;
        tab.wait_until_navigated()
            .map_err(|e| Self::classify("Task navigation", e))?;
        self.login_if_needed(tab)?;
        std::thread::sleep(self.settle_wait);
        Ok(())
    }

    fn observe_blocking(&self) -> Result<Vec<TaskObservation>, PortalError> {
        let tab = self.open_tab()?;
        let result = self.observe_on(&tab);
        Self::close_tab(&tab);
        result
    }

    fn observe_on(&self, tab: &Arc<Tab>) -> Result<Vec<TaskObservation>, PortalError> {
        self.goto_home(tab)?;

        // 没有待办任务时选择器不命中，返回空列表；其余错误（协议 / 超时）照常上报，
        // 不能把真实故障误报成「没有待办任务」
        let anchors = match tab.find_elements(TASK_ANCHOR_SELECTOR) {
            Ok(elements) => elements,
            Err(e) => match Self::classify("Task anchors", e) {
                PortalError::ElementNotFound(_) => Vec::new(),
                other => return Err(other),
            },
        };

        let mut observations = Vec::new();
        for anchor in anchors {
            let title = anchor
                .get_inner_text()
                .map_err(|e| Self::classify("Task title", e))?;
            let link = anchor
                .get_attributes()
                .map_err(|e| Self::classify("Task link", e))?
                .and_then(|attrs| {
                    attrs
                        .chunks(2)
                        .find(|pair| pair.first().map(String::as_str) == Some("href"))
                        .and_then(|pair| pair.get(1).cloned())
                });
            // 列表页只有标题与链接，正文留空由 Pipeline 补全
            observations.push(TaskObservation {
                title,
                description: String::new(),
                link,
            });
        }
        tracing::info!(count = observations.len(), "Observed pending tasks");
        Ok(observations)
    }

    fn fetch_description_blocking(&self, link: &str) -> Result<String, PortalError> {
        let tab = self.open_tab()?;
        let result = self.fetch_on(&tab, link);
        Self::close_tab(&tab);
        result
    }

    fn fetch_on(&self, tab: &Arc<Tab>, link: &str) -> Result<String, PortalError> {
        self.goto_task(tab, link)?;
        let main = tab
            .wait_for_element(MAIN_SELECTOR)
            .map_err(|e| Self::classify("Task main content", e))?;
        main.get_inner_text()
            .map_err(|e| Self::classify("Task text", e))
    }

    fn create_draft_blocking(&self, link: &str, text: &str) -> Result<(), PortalError> {
        let tab = self.open_tab()?;
        let result = self.draft_on(&tab, link, text);
        Self::close_tab(&tab);
        result
    }

    fn draft_on(&self, tab: &Arc<Tab>, link: &str, text: &str) -> Result<(), PortalError> {
        self.goto_task(tab, link)?;

        tab.wait_for_xpath("//button[contains(., 'Agregar o crear')]")
            .map_err(|e| Self::classify("Attach button", e))?
            .click()
            .map_err(|e| Self::classify("Attach button", e))?;
        std::thread::sleep(Duration::from_millis(2000));

        tab.wait_for_xpath("//div[@role='menuitem'][contains(., 'Documentos')]")
            .map_err(|e| Self::classify("Docs menu item", e))?
            .click()
            .map_err(|e| Self::classify("Docs menu item", e))?;
        std::thread::sleep(Duration::from_millis(5000));

        // 新建的文档在最后一个标签页打开
        let doc_tab = {
            let guard = self.browser.read().map_err(|e| PortalError::Browser(e.to_string()))?;
            let browser = guard
                .as_ref()
                .ok_or_else(|| PortalError::Browser("browser not running".to_string()))?;
            let tabs = browser
                .get_tabs()
                .lock()
                .map_err(|e| PortalError::Browser(e.to_string()))?;
            tabs.last()
                .cloned()
                .ok_or_else(|| PortalError::ElementNotFound("doc tab".to_string()))?
        };
        // 文档标签页同样用完即关，写入失败也不例外
        let typed = self.type_into_doc(&doc_tab, text);
        Self::close_tab(&doc_tab);
        typed
    }

    fn type_into_doc(&self, doc_tab: &Arc<Tab>, text: &str) -> Result<(), PortalError> {
        doc_tab
            .wait_until_navigated()
            .map_err(|e| Self::classify("Doc tab", e))?;
        doc_tab
            .type_str(text)
            .map_err(|e| Self::classify("Doc typing", e))?;
        std::thread::sleep(Duration::from_millis(2000));
        Ok(())
    }
}

#[async_trait]
impl Portal for ClassroomPortal {
    async fn observe_tasks(&self) -> Result<Vec<TaskObservation>, PortalError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.observe_blocking())
            .await
            .map_err(|e| PortalError::Browser(format!("Task join: {}", e)))?
    }

    async fn fetch_description(&self, link: &str) -> Result<String, PortalError> {
        let this = self.clone();
        let link = link.to_string();
        tokio::task::spawn_blocking(move || this.fetch_description_blocking(&link))
            .await
            .map_err(|e| PortalError::Browser(format!("Task join: {}", e)))?
    }

    async fn create_draft_document(&self, link: &str, text: &str) -> Result<(), PortalError> {
        let this = self.clone();
        let link = link.to_string();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || this.create_draft_blocking(&link, &text))
            .await
            .map_err(|e| PortalError::Browser(format!("Task join: {}", e)))?
    }
}
