use serde::{Deserialize, Serialize};

use super::answer::AnswerOption;

/// 获取题目接口的响应
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResponse {
    #[serde(default)]
    pub q_num: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    pub question: QuestionBody,
}

/// 题目正文，选项字段可能是字符串也可能是数字
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionBody {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_text")]
    pub option_a: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_text")]
    pub option_b: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_text")]
    pub option_c: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_text")]
    pub option_d: Option<String>,
    /// 传输编码后的图片，原样透传
    #[serde(default)]
    pub images: Option<String>,
}

impl QuestionResponse {
    /// 转换为领域对象
    ///
    /// 响应缺少题号时使用请求的题号，缺少总数时视为 0
    pub fn into_loaded(self, requested: u32) -> LoadedQuestion {
        LoadedQuestion {
            question_number: self.q_num.unwrap_or(requested),
            total_questions: self.total.unwrap_or(0),
            question: self.question.into(),
        }
    }
}

/// 一次成功加载的完整题目上下文
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedQuestion {
    pub question_number: u32,
    pub total_questions: u32,
    pub question: Question,
}

/// 题目内容
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Question {
    pub text: String,
    options: [Option<String>; 4],
    /// 原始图片载荷（未解码）
    pub image: Option<String>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_option(mut self, option: AnswerOption, text: impl Into<String>) -> Self {
        self.options[option.index()] = Some(text.into());
        self
    }

    pub fn with_image(mut self, payload: impl Into<String>) -> Self {
        self.image = Some(payload.into());
        self
    }

    /// 选项文本，空字符串视为未提供
    pub fn option(&self, option: AnswerOption) -> Option<&str> {
        self.options[option.index()]
            .as_deref()
            .filter(|text| !text.is_empty())
    }

    /// 本题实际提供的选项（按字母顺序）
    pub fn offered_options(&self) -> Vec<AnswerOption> {
        AnswerOption::ALL
            .into_iter()
            .filter(|opt| self.option(*opt).is_some())
            .collect()
    }
}

impl From<QuestionBody> for Question {
    fn from(body: QuestionBody) -> Self {
        Self {
            text: body.question.unwrap_or_default(),
            options: [body.option_a, body.option_b, body.option_c, body.option_d],
            image: body.images,
        }
    }
}

/// 切换标记接口的响应
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MarkResponse {
    pub marked: bool,
}

/// 交卷接口的响应，成绩结构不做解析
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub scores: serde_json::Value,
}

// 选项可能是字符串、数字或 null
fn deserialize_option_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct OptionTextVisitor;

    impl<'de> Visitor<'de> for OptionTextVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, a number or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(OptionTextVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_response_parses_mixed_option_types() {
        let response: QuestionResponse = serde_json::from_value(json!({
            "q_num": 2,
            "total": 3,
            "question": {
                "question": "2 + 2 = ?",
                "option_a": 3,
                "option_b": "4",
                "option_c": "",
                "option_d": null,
                "images": "iVBORw0KGgo="
            }
        }))
        .unwrap();

        let loaded = response.into_loaded(2);
        assert_eq!(loaded.question_number, 2);
        assert_eq!(loaded.total_questions, 3);
        assert_eq!(loaded.question.option(AnswerOption::A), Some("3"));
        assert_eq!(loaded.question.option(AnswerOption::C), None);
        assert_eq!(
            loaded.question.offered_options(),
            vec![AnswerOption::A, AnswerOption::B]
        );
        assert_eq!(loaded.question.image.as_deref(), Some("iVBORw0KGgo="));
    }

    #[test]
    fn test_missing_q_num_and_total_use_fallbacks() {
        let response: QuestionResponse =
            serde_json::from_value(json!({ "question": { "question": "x" } })).unwrap();

        let loaded = response.into_loaded(5);
        assert_eq!(loaded.question_number, 5);
        assert_eq!(loaded.total_questions, 0);
        assert!(loaded.question.offered_options().is_empty());
    }

    #[test]
    fn test_submit_response_passes_scores_through() {
        let response: SubmitResponse = serde_json::from_value(json!({
            "scores": { "physics": 12, "total": 40 }
        }))
        .unwrap();
        assert_eq!(response.scores["total"], 40);
    }
}
