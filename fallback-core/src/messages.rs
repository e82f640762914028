//! Reply texts.

use serde::{Deserialize, Serialize};

const IN_HOURS: &str = "รบกวนคุณลูกค้ารอเจ้าหน้าที่ฝ่ายบริการตอบกลับอีกครั้งนะคะ คุณลูกค้าสามารถพิมพ์คำถามไว้ได้เลยค่ะ";

const AFTER_HOURS: &str = "รบกวนคุณลูกค้ารอเจ้าหน้าที่ฝ่ายบริการตอบกลับอีกครั้งนะคะ ทั้งนี้เจ้าหน้าที่ฝ่ายบริการทำการจันทร์-เสาร์ เวลา 09.00-00.00 น. และวันอาทิตย์ทำการเวลา 09.00-18.00 น. ค่ะ คุณลูกค้าสามารถพิมพ์คำถามไว้ได้เลยนะคะ เจ้าหน้าที่จะทำการตอบกลับอีกครั้งในวเลาทำการค่ะ";

const APOLOGY: &str = "ขออภัย เกิดข้อผิดพลาด กรุณาลองใหม่อีกครั้ง";

/// Texts shown to the end user for each outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationMessages {
    /// Escalation inside business hours.
    pub in_hours: String,
    /// Escalation outside business hours; includes the operating hours.
    pub after_hours: String,
    /// Generic "please try again" shown when the decision failed.
    pub apology: String,
}

impl Default for EscalationMessages {
    fn default() -> Self {
        Self {
            in_hours: IN_HOURS.to_string(),
            after_hours: AFTER_HOURS.to_string(),
            apology: APOLOGY.to_string(),
        }
    }
}

impl EscalationMessages {
    /// Escalation text for the given business-hours state.
    pub fn select(&self, within_hours: bool) -> &str {
        if within_hours {
            &self.in_hours
        } else {
            &self.after_hours
        }
    }
}
