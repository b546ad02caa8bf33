// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! Message catalogs. English text comes from the library's `Display`
//! impls; Simplified Chinese templates are kept here, keyed by message key.

use irvm::console::Message;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    ZhCn,
    En,
}

/// Renders `message` in `language`, falling back to English for a key
/// without a template.
pub fn render(message: &Message, language: Language) -> String {
    match language {
        Language::En => message.to_string(),
        Language::ZhCn => match zh_cn(message.key()) {
            Some(template) => interpolate(template, &message.values()),
            None => {
                log::warn!("no zh-CN template for {}", message.key());
                message.to_string()
            }
        },
    }
}

/// Replaces every `{name}` in `template` with its value. Placeholders
/// without a value are kept as written.
fn interpolate(template: &str, values: &[(&str, String)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        let name = &after[..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => rendered.push_str(value),
            None => rendered.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    rendered.push_str(rest);
    rendered
}

fn zh_cn(key: &str) -> Option<&'static str> {
    let template = match key {
        // static errors
        "STATIC_ERROR_PREFIX" => "静态分析错误(第{lineNumber}行)：",
        "STATIC_ERROR_PREFIX_NO_LINE_NUMBER" => "静态分析错误：",
        "DECODE_ERROR_PREFIX" => "指令解码错误(第{lineNumber}行)：",
        "UNRECOGNIZED_INSTRUCTION" => "无法识别的IR指令",
        "ILLEGAL_INSTRUCTION_FORMAT" => "指令格式非法",
        "FUNCTION_ILLEGAL_ID" => "FUNCTION指令函数名非法",
        "ASSIGN_ILLEGAL_LEFT" => "赋值指令左侧非法",
        "ASSIGN_ILLEGAL_RIGHT" => "赋值指令右侧一元值非法",
        "ASSIGN_RIGHT_IMM_TOO_LARGE" => "赋值指令右侧立即数过大",
        "ASSIGN_ILLEGAL_RIGHT_OPERATOR" => "赋值指令右侧算术运算符非法",
        "ASSIGN_ILLEGAL_RIGHT_OPERAND1" => "赋值指令右侧第一个一元值操作数非法",
        "ASSIGN_RIGHT_OPERAND1_IMM_TOO_LARGE" => {
            "赋值指令右侧第一个立即数操作数过大"
        }
        "ASSIGN_ILLEGAL_RIGHT_OPERAND2" => "赋值指令右侧第二个一元值操作数非法",
        "ASSIGN_RIGHT_OPERAND2_IMM_TOO_LARGE" => {
            "赋值指令右侧第二个立即数操作数过大"
        }
        "DEC_ILLEGAL_ID" => "DEC指令变量名非法",
        "DEC_ILLEGAL_SIZE_FORMAT" => "DEC指令分配空间格式非法",
        "DEC_SIZE_TOO_LARGE" => "DEC指令分配空间过大",
        "DEC_SIZE_NOT_4_MULTIPLE" => "DEC指令分配空间大小不是4的倍数",
        "GLOBAL_DEC_ILLEGAL_ID" => "GLOBAL_DEC指令变量名非法",
        "GLOBAL_DEC_ILLEGAL_SIZE_FORMAT" => "GLOBAL_DEC指令分配空间格式非法",
        "GLOBAL_DEC_SIZE_TOO_LARGE" => "GLOBAL_DEC指令分配空间过大",
        "GLOBAL_DEC_SIZE_NOT_4_MULTIPLE" => {
            "GLOBAL_DEC指令分配空间大小不是4的倍数"
        }
        "LABEL_ILLEGAL_ID" => "LABEL指令标签名非法",
        "GOTO_ILLEGAL_ID" => "GOTO指令标签名非法",
        "DUPLICATE_LABEL_ID" => {
            "LABEL指令声明的标签名'{id}'已存在(上次声明在第{lastLineNumber}行)"
        }
        "DUPLICATE_FUNCTION_ID" => {
            "FUNCTION指令声明的函数名'{id}'已存在(上次声明在第{lastLineNumber}行)"
        }
        "IF_ILLEGAL_COND_OPERATOR" => "IF指令条件表达式的条件运算符非法",
        "IF_ILLEGAL_COND_OPERAND1" => "IF指令条件表达式的第一个一元值操作数非法",
        "IF_COND_OPERAND1_IMM_TOO_LARGE" => {
            "IF指令条件表达式的第一个立即数操作数过大"
        }
        "IF_ILLEGAL_COND_OPERAND2" => "IF指令条件表达式的第二个一元值操作数非法",
        "IF_COND_OPERAND2_IMM_TOO_LARGE" => {
            "IF指令条件表达式的第二个立即数操作数过大"
        }
        "IF_ILLEGAL_GOTO_ID" => "IF指令GOTO标签名非法",
        "ARG_ILLEGAL" => "ARG指令一元值实参非法",
        "ARG_IMM_TOO_LARGE" => "ARG指令立即数实参过大",
        "CALL_ILLEGAL_ID" => "CALL指令调用函数名非法",
        "PARAM_ILLEGAL_ID" => "PARAM指令形参名非法",
        "RETURN_ILLEGAL" => "RETURN指令一元值返回值非法",
        "RETURN_IMM_TOO_LARGE" => "RETURN指令立即数返回值过大",
        "READ_ILLEGAL" => "提供给READ指令的写入目标非法",
        "WRITE_ILLEGAL" => "提供给WRITE指令的一元值非法",
        "WRITE_IMM_TOO_LARGE" => "提供给WRITE指令的立即数过大",
        "NO_MAIN_FUNCTION" => "未定义'main'函数",

        // runtime errors
        "RUNTIME_ERROR_PREFIX" => "运行时错误(第{lineNumber}行)：",
        "RUNTIME_ERROR_PREFIX_NO_LN" => "运行时错误：",
        "GLOBAL_VARIABLE_SEGMENT_OVERFLOW" => "全局变量空间溢出",
        "STACK_OVERFLOW" => "栈空间溢出",
        "VARIABLE_NOT_FOUND" => "找不到变量'{id}'",
        "FUNCTION_NOT_FOUND" => "找不到函数'{id}'",
        "LABEL_NOT_FOUND" => "找不到标签'{id}'",
        "INSTRUCTION_READ_OUT_OF_BOUND" => {
            "从地址{address}处读入指令超出了指令地址空间"
        }
        "MEMORY_READ_OUT_OF_BOUND" => "从地址{address}读入4字节时超出了地址空间",
        "MEMORY_WRITE_OUT_OF_BOUND" => "向地址{address}写入4字节时超出了地址空间",
        "EMPTY_VARIABLE_TABLE_STACK" => "局部变量符号表栈为空",
        "DUPLICATE_DEC_ID" => {
            "DEC指令声明的变量名'{id}'已存在(上次声明在第{lastLineNumber}行)"
        }
        "DUPLICATE_GLOBAL_DEC_ID" => {
            "GLOBAL_DEC指令声明的全局变量名'{id}'已存在(上次声明在第{lastLineNumber}行)"
        }
        "DUPLICATE_PARAM_ID" => {
            "PARAM指令声明的形参名'{id}'已存在(上次声明在第{lastLineNumber}行)"
        }
        "DIVIDE_BY_ZERO" => "不能除以0",
        "MAX_STEP_REACHED" => "已到达最大执行步数限制({maxExecutionStepCount})",
        "INPUT_INT_ILLEGAL" => "输入的整数格式非法",
        "INPUT_INT_ABS_TOO_LARGE" => "输入的整数绝对值过大",

        // console
        "WRITE_OUTPUT" => "{value}",
        "READ_PROMPT" => "请输入{name}的值：",
        "CONSOLE_ARROW" => ">",
        "READ_INPUT" => "{value}",
        "PROGRAM_EXITED" => "程序执行结束，返回值为{returnValue}。",
        "EXECUTION_STEP_COUNT_TIME" => {
            "总执行步数：{stepCount}；总执行耗时：{time}ms"
        }
        _ => return None,
    };
    Some(template)
}
