use super::{def, free_op, jrel_op, local_op, name_op, const_op, OpInfo};

pub(super) static OPCODES: &[OpInfo] = &[
    def(0, "CACHE"),
    def(1, "POP_TOP"),
    def(2, "PUSH_NULL"),
    def(9, "NOP"),
    def(10, "UNARY_POSITIVE"),
    def(11, "UNARY_NEGATIVE"),
    def(12, "UNARY_NOT"),
    def(15, "UNARY_INVERT"),
    def(25, "BINARY_SUBSCR"),
    def(30, "GET_LEN"),
    def(31, "MATCH_MAPPING"),
    def(32, "MATCH_SEQUENCE"),
    def(33, "MATCH_KEYS"),
    def(35, "PUSH_EXC_INFO"),
    def(36, "CHECK_EXC_MATCH"),
    def(37, "CHECK_EG_MATCH"),
    def(49, "WITH_EXCEPT_START"),
    def(50, "GET_AITER"),
    def(51, "GET_ANEXT"),
    def(52, "BEFORE_ASYNC_WITH"),
    def(53, "BEFORE_WITH"),
    def(54, "END_ASYNC_FOR"),
    def(60, "STORE_SUBSCR"),
    def(61, "DELETE_SUBSCR"),
    def(68, "GET_ITER"),
    def(69, "GET_YIELD_FROM_ITER"),
    def(70, "PRINT_EXPR"),
    def(71, "LOAD_BUILD_CLASS"),
    def(74, "LOAD_ASSERTION_ERROR"),
    def(75, "RETURN_GENERATOR"),
    def(82, "LIST_TO_TUPLE"),
    def(83, "RETURN_VALUE"),
    def(84, "IMPORT_STAR"),
    def(85, "SETUP_ANNOTATIONS"),
    def(86, "YIELD_VALUE"),
    def(87, "ASYNC_GEN_WRAP"),
    def(88, "PREP_RERAISE_STAR"),
    def(89, "POP_EXCEPT"),
    name_op(90, "STORE_NAME"),
    name_op(91, "DELETE_NAME"),
    def(92, "UNPACK_SEQUENCE"),
    jrel_op(93, "FOR_ITER"),
    def(94, "UNPACK_EX"),
    name_op(95, "STORE_ATTR"),
    name_op(96, "DELETE_ATTR"),
    name_op(97, "STORE_GLOBAL"),
    name_op(98, "DELETE_GLOBAL"),
    def(99, "SWAP"),
    const_op(100, "LOAD_CONST"),
    name_op(101, "LOAD_NAME"),
    def(102, "BUILD_TUPLE"),
    def(103, "BUILD_LIST"),
    def(104, "BUILD_SET"),
    def(105, "BUILD_MAP"),
    name_op(106, "LOAD_ATTR"),
    def(107, "COMPARE_OP"),
    name_op(108, "IMPORT_NAME"),
    name_op(109, "IMPORT_FROM"),
    jrel_op(110, "JUMP_FORWARD"),
    jrel_op(111, "JUMP_IF_FALSE_OR_POP"),
    jrel_op(112, "JUMP_IF_TRUE_OR_POP"),
    jrel_op(114, "POP_JUMP_FORWARD_IF_FALSE"),
    jrel_op(115, "POP_JUMP_FORWARD_IF_TRUE"),
    name_op(116, "LOAD_GLOBAL"),
    def(117, "IS_OP"),
    def(118, "CONTAINS_OP"),
    def(119, "RERAISE"),
    def(120, "COPY"),
    def(122, "BINARY_OP"),
    jrel_op(123, "SEND"),
    local_op(124, "LOAD_FAST"),
    local_op(125, "STORE_FAST"),
    local_op(126, "DELETE_FAST"),
    jrel_op(128, "POP_JUMP_FORWARD_IF_NOT_NONE"),
    jrel_op(129, "POP_JUMP_FORWARD_IF_NONE"),
    def(130, "RAISE_VARARGS"),
    def(131, "GET_AWAITABLE"),
    def(132, "MAKE_FUNCTION"),
    def(133, "BUILD_SLICE"),
    jrel_op(134, "JUMP_BACKWARD_NO_INTERRUPT"),
    free_op(135, "MAKE_CELL"),
    free_op(136, "LOAD_CLOSURE"),
    free_op(137, "LOAD_DEREF"),
    free_op(138, "STORE_DEREF"),
    free_op(139, "DELETE_DEREF"),
    jrel_op(140, "JUMP_BACKWARD"),
    def(142, "CALL_FUNCTION_EX"),
    def(144, "EXTENDED_ARG"),
    def(145, "LIST_APPEND"),
    def(146, "SET_ADD"),
    def(147, "MAP_ADD"),
    free_op(148, "LOAD_CLASSDEREF"),
    def(149, "COPY_FREE_VARS"),
    def(151, "RESUME"),
    def(152, "MATCH_CLASS"),
    def(155, "FORMAT_VALUE"),
    def(156, "BUILD_CONST_KEY_MAP"),
    def(157, "BUILD_STRING"),
    name_op(160, "LOAD_METHOD"),
    def(162, "LIST_EXTEND"),
    def(163, "SET_UPDATE"),
    def(164, "DICT_MERGE"),
    def(165, "DICT_UPDATE"),
    def(166, "PRECALL"),
    def(171, "CALL"),
    const_op(172, "KW_NAMES"),
    jrel_op(173, "POP_JUMP_BACKWARD_IF_NOT_NONE"),
    jrel_op(174, "POP_JUMP_BACKWARD_IF_NONE"),
    jrel_op(175, "POP_JUMP_BACKWARD_IF_FALSE"),
    jrel_op(176, "POP_JUMP_BACKWARD_IF_TRUE"),
];
