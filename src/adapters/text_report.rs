//! Plain-text evaluation report (`{name}_综合评价报告.txt`).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::analysis::AnalysisReport;
use crate::domain::error::StockevalError;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_NEWS_LIMIT: usize = 20;
const RULE_WIDE: usize = 60;
const RULE_NARROW: usize = 40;

const DISCLAIMER: [&str; 5] = [
    "本分析基于公开数据，仅供参考，不构成投资建议",
    "股市有风险，投资需谨慎",
    "请结合自身风险承受能力做出投资决策",
    "建议分散投资，不要将所有资金投入单一股票",
    "定期关注公司公告和行业动态",
];

/// Replace characters that cannot appear in a file name.
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

pub fn report_file_name(stock_name: &str) -> String {
    format!("{}_综合评价报告.txt", file_stem(stock_name))
}

/// `1234567` → `1,234,567`
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "-".repeat(RULE_NARROW))
}

pub fn render_report(report: &AnalysisReport, news_limit: usize) -> String {
    let mut output = String::new();

    output.push_str(&render_header(report));
    output.push_str(&render_sentiment(report));
    output.push_str(&render_technical(report));
    output.push_str(&render_score(report));
    output.push_str(&render_advice(report));
    output.push_str(&render_alerts(report));
    output.push_str(&render_sources(report));
    output.push_str(&render_disclaimer());
    output.push_str(&render_headlines(report, news_limit));

    output
}

fn render_header(report: &AnalysisReport) -> String {
    let mut output = format!("{}股票综合评价报告\n", report.target.name);
    output.push_str(&format!("{}\n", "=".repeat(RULE_WIDE)));
    output.push_str(&format!(
        "分析时间：{}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str(&format!("股票代码：{}\n\n", report.target.code));
    output
}

fn render_sentiment(report: &AnalysisReport) -> String {
    let sentiment = &report.sentiment;
    let mut output = heading("📰 新闻情绪分析");
    output.push_str(&format!("新闻总数：{} 条\n", report.news.items.len()));
    output.push_str(&format!("正面新闻：{} 条\n", sentiment.positive));
    output.push_str(&format!("中性新闻：{} 条\n", sentiment.neutral));
    output.push_str(&format!("负面新闻：{} 条\n", sentiment.negative));
    output.push_str(&format!("平均情绪分数：{:.2}\n", sentiment.average));
    output.push_str(&format!("总体情绪倾向：{}\n", sentiment.label));
    output.push_str(&format!(
        "情绪评分：{:.1}/100\n\n",
        report.score.sentiment_score
    ));
    output
}

fn render_technical(report: &AnalysisReport) -> String {
    let snap = &report.technical.snapshot;
    let mut output = heading("📈 技术指标分析");
    output.push_str(&format!("最新交易日：{}\n", snap.date.format("%Y-%m-%d")));
    output.push_str(&format!("收盘价：{:.2} 元\n", snap.close));
    output.push_str(&format!("涨跌幅：{:.2}%\n", snap.pct_change));
    output.push_str(&format!("成交量：{}\n", group_thousands(snap.volume)));
    output.push_str(&format!(
        "均线系统：MA5={:.2}, MA10={:.2}, MA20={:.2}\n",
        snap.ma5, snap.ma10, snap.ma20
    ));
    output.push_str(&format!(
        "指数均线：EMA12={:.2}, EMA26={:.2}\n",
        snap.ema12, snap.ema26
    ));
    output.push_str(&format!(
        "MACD指标：DIF={:.2}, DEA={:.2}, MACD={:.2}\n",
        snap.diff, snap.dea, snap.macd_hist
    ));
    output.push_str(&format!(
        "KDJ指标：K={:.1}, D={:.1}, J={:.1}\n",
        snap.k, snap.d, snap.j
    ));
    output.push_str(&format!(
        "成交量放大：{}\n",
        if snap.volume_high { "是" } else { "否" }
    ));
    output.push_str(&format!("技术信号：{}\n", snap.signal_label()));
    output.push_str(&format!(
        "技术评分：{:.1}/100\n\n",
        report.score.technical_score
    ));
    output
}

fn render_score(report: &AnalysisReport) -> String {
    let mut output = heading("🎯 综合评分");
    output.push_str(&format!(
        "新闻情绪权重：{:.0}%\n",
        report.sentiment_weight * 100.0
    ));
    output.push_str(&format!(
        "技术指标权重：{:.0}%\n",
        report.technical_weight * 100.0
    ));
    output.push_str(&format!("综合评分：{:.1}/100\n\n", report.score.final_score));
    output
}

fn render_advice(report: &AnalysisReport) -> String {
    let score = &report.score;
    let mut output = heading("💡 投资建议");
    output.push_str(&format!("操作建议：{}\n", score.recommendation));
    output.push_str(&format!("置信度：{}\n", score.confidence));
    output.push_str(&format!("风险等级：{}\n\n", score.risk_level));
    output
}

fn render_alerts(report: &AnalysisReport) -> String {
    let mut output = heading("🚨 风险关键词提醒");
    if report.alerts.is_empty() {
        output.push_str("未发现风险关键词\n");
    }
    for item in &report.alerts {
        output.push_str(&format!("- {}: {}\n", item.date, item.title));
    }
    output.push('\n');
    output
}

fn render_sources(report: &AnalysisReport) -> String {
    let mut output = heading("📡 数据源贡献");
    if report.news.outcomes.is_empty() {
        output.push_str("未配置新闻数据源\n");
    }
    for outcome in &report.news.outcomes {
        let line = match &outcome.error {
            None => format!(
                "{}：{} 条（去重后保留 {} 条）\n",
                outcome.source,
                outcome.count,
                report.news.kept_from(&outcome.source)
            ),
            Some(reason) => format!("{}：获取失败（{}）\n", outcome.source, reason),
        };
        output.push_str(&line);
    }
    output.push('\n');
    output
}

fn render_disclaimer() -> String {
    let mut output = heading("⚠️ 风险提示");
    for (i, line) in DISCLAIMER.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, line));
    }
    output.push('\n');
    output
}

fn render_headlines(report: &AnalysisReport, news_limit: usize) -> String {
    let mut output = heading("📰 最新相关新闻");
    for (i, item) in report.news.items.iter().take(news_limit).enumerate() {
        output.push_str(&format!("{}. {}: {}\n", i + 1, item.date, item.title));
    }
    output
}

/// Subject and markdown body for a push notification.
pub fn render_summary(report: &AnalysisReport) -> (String, String) {
    let score = &report.score;
    let snap = &report.technical.snapshot;
    let subject = format!(
        "{} {:.1}分 {}",
        report.target, score.final_score, score.recommendation
    );

    let mut body = format!("**{}** {}\n\n", report.target, snap.date.format("%Y-%m-%d"));
    body.push_str(&format!(
        "- 收盘价：{:.2} 元（{:+.2}%）\n",
        snap.close, snap.pct_change
    ));
    body.push_str(&format!(
        "- 新闻情绪：{}（正面 {} / 中性 {} / 负面 {}）\n",
        report.sentiment.label,
        report.sentiment.positive,
        report.sentiment.neutral,
        report.sentiment.negative
    ));
    body.push_str(&format!(
        "- 情绪评分 {:.1}，技术评分 {:.1}，综合评分 {:.1}\n",
        score.sentiment_score, score.technical_score, score.final_score
    ));
    body.push_str(&format!(
        "- 操作建议：{}，置信度 {}，风险等级 {}\n",
        score.recommendation, score.confidence, score.risk_level
    ));
    if !report.alerts.is_empty() {
        body.push_str("\n风险关键词提醒：\n");
        for item in &report.alerts {
            body.push_str(&format!("- {}: {}\n", item.date, item.title));
        }
    }
    (subject, body)
}

pub struct TextReportAdapter {
    news_limit: usize,
}

impl TextReportAdapter {
    pub fn new(news_limit: usize) -> Self {
        Self { news_limit }
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_NEWS_LIMIT)
    }
}

impl ReportPort for TextReportAdapter {
    fn write(&self, report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf, StockevalError> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(report_file_name(&report.target.name));
        fs::write(&path, render_report(report, self.news_limit))?;
        info!(path = %path.display(), "text report written");
        Ok(path)
    }
}
